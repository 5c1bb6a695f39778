//! OxyTrack Core Library
//!
//! Models, the local cache, the remote mirror and the Sync Store shared by
//! the OxyTrack command line and server.

pub mod cache;
pub mod models;
pub mod production;
pub mod protocol;
pub mod remote;
pub mod reminder;
pub mod report;
pub mod sale;
pub mod stats;
pub mod store;
pub mod timestamp;
pub mod validation;

pub use cache::{CacheError, LocalCache};
pub use models::{
    AppSettings, BottleDestination, ClientType, ProductionEntry, ProductionStatus, SaleEntry,
    SaleStatus, SettingsPatch,
};
pub use production::{CompleteProduction, CompletedProduction, StartProduction};
pub use protocol::{Collection, RemoteDocument, SnapshotMessage};
pub use remote::{check_server, HttpRemote, MemoryRemote, RemoteError, RemoteStore};
pub use reminder::{Reminder, ReminderSchedule};
pub use report::MonthlyReport;
pub use sale::SaleForm;
pub use stats::{DailyStats, DashboardStats, YearMonth};
pub use store::{Notification, NotificationLevel, StoreError, StoreResult, Subscriptions, SyncStore};
pub use validation::{ValidationError, ValidationResult};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
