mod client;
mod config_cmd;
mod production;
mod report;
mod sale;
mod settings_cmd;
mod stats;
mod sync_cmd;
mod watch;

use clap::ValueEnum;

pub use client::ClientCommand;
pub use config_cmd::ConfigCommand;
pub use production::ProductionCommand;
pub use report::ReportCommand;
pub use sale::SaleCommand;
pub use settings_cmd::SettingsCommand;
pub use stats::StatsCommand;
pub use sync_cmd::SyncCommand;
pub use watch::{RemindCommand, WatchCommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Resolves a full id or a unique id prefix.
fn resolve_id(ids: &[String], query: &str, kind: &str) -> Result<String, String> {
    if let Some(id) = ids.iter().find(|id| id.as_str() == query) {
        return Ok(id.clone());
    }

    let matches: Vec<&String> = ids.iter().filter(|id| id.starts_with(query)).collect();
    match matches.as_slice() {
        [id] if !query.is_empty() => Ok((*id).clone()),
        [] | [_] => Err(format!("{} not found: {}", kind, query)),
        _ => Err(format!(
            "Ambiguous {} id '{}' matches {} entries",
            kind.to_lowercase(),
            query,
            matches.len()
        )),
    }
}
