//! Sync CLI commands for the remote document server.

use clap::{Args, Subcommand};

use oxytrack_core::StoreError;

use crate::context::AppContext;

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,

    /// Send again every local change the server has not acknowledged
    Push,
}

impl SyncCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), SyncCommandError> {
        if !ctx.config.has_remote() && !matches!(self.command, Some(SyncSubcommand::Status)) {
            return Err(SyncCommandError::NotConfigured);
        }

        match &self.command {
            None => self.sync(ctx),
            Some(SyncSubcommand::Status) => self.status(ctx),
            Some(SyncSubcommand::Push) => self.push(ctx),
        }
    }

    fn sync(&self, ctx: &AppContext<'_>) -> Result<(), SyncCommandError> {
        println!("Syncing with server...");
        println!();

        ctx.block_on(ctx.store.sync_once())?;

        println!("  ✓ productions ({})", ctx.store.production_entries().len());
        println!("  ✓ sales ({})", ctx.store.sale_entries().len());
        println!("  ✓ settings");
        println!();

        let pending = ctx.store.pending_writes();
        if pending > 0 {
            println!(
                "{} local change(s) not yet on the server. Run 'oxy sync push' to send them.",
                pending
            );
        } else {
            println!("Sync complete.");
        }
        Ok(())
    }

    fn status(&self, ctx: &AppContext<'_>) -> Result<(), SyncCommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let Some(remote) = ctx.remote() else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  remote:");
            println!("    url: \"http://localhost:8080\"");
            println!("    api_key: \"<key>\"");
            println!();
            println!("Or set environment variables:");
            println!("  OXY_REMOTE_URL, OXY_API_KEY");
            return Ok(());
        };

        println!("Server:          {}", remote.server_url());
        println!("Data directory:  {}", ctx.config.data_dir.value.display());
        println!("Pending writes:  {}", ctx.store.pending_writes());
        println!();

        print!("Server status: ");
        if ctx.block_on(remote.check_server()) {
            println!("✓ connected");
        } else {
            println!("✗ unreachable");
        }
        Ok(())
    }

    fn push(&self, ctx: &AppContext<'_>) -> Result<(), SyncCommandError> {
        let before = ctx.store.pending_writes();
        if before == 0 {
            println!("Nothing to push.");
            return Ok(());
        }

        let sent = ctx.store.push_pending();
        ctx.block_on(ctx.store.drain());

        let remaining = ctx.store.pending_writes();
        println!(
            "Sent {} change(s); {} acknowledged, {} still pending.",
            sent,
            before.saturating_sub(remaining),
            remaining
        );
        Ok(())
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    StoreError(StoreError),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Sync is not configured. Set remote.url and remote.api_key (see 'oxy sync status')."
            ),
            SyncCommandError::StoreError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::NotConfigured => None,
            SyncCommandError::StoreError(e) => Some(e),
        }
    }
}

impl From<StoreError> for SyncCommandError {
    fn from(e: StoreError) -> Self {
        SyncCommandError::StoreError(e)
    }
}
