mod production;
mod sale;
mod settings;

pub use production::{BottleDestination, ProductionEntry, ProductionStatus};
pub use sale::{ClientType, SaleEntry, SaleStatus};
pub use settings::{AppSettings, SettingsPatch, DEFAULT_COMPANY_NAME, DEFAULT_PRODUCER};
