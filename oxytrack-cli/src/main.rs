use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod context;
mod input;

use commands::{
    ClientCommand, ConfigCommand, ProductionCommand, RemindCommand, ReportCommand, SaleCommand,
    SettingsCommand, StatsCommand, SyncCommand, WatchCommand,
};
use config::Config;
use context::AppContext;

#[derive(Parser)]
#[command(name = "oxy")]
#[command(version)]
#[command(about = "Oxygen bottle production and sales log", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start, complete and list production runs
    Production(ProductionCommand),

    /// Record sales and bottle recovery
    Sale(SaleCommand),

    /// Manage client names
    Client(ClientCommand),

    /// Shared application settings
    Settings(SettingsCommand),

    /// Dashboard and monthly statistics
    Stats(StatsCommand),

    /// Monthly activity report
    Report(ReportCommand),

    /// Sync with remote server
    Sync(SyncCommand),

    /// Follow the remote server live
    Watch(WatchCommand),

    /// Operator reminders
    Remind(RemindCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, cli_config_path),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();
    let ctx = AppContext::open(&config, &runtime);

    if pulls_before_running(&command) {
        ctx.refresh();
    }

    let result = execute_command(&command, &ctx);
    ctx.finish();
    result
}

fn execute_command(
    command: &Commands,
    ctx: &AppContext<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Production(cmd) => cmd.run(ctx)?,
        Commands::Sale(cmd) => cmd.run(ctx)?,
        Commands::Client(cmd) => cmd.run(ctx)?,
        Commands::Settings(cmd) => cmd.run(ctx)?,
        Commands::Stats(cmd) => cmd.run(ctx)?,
        Commands::Report(cmd) => cmd.run(ctx)?,
        Commands::Sync(cmd) => cmd.run(ctx)?,
        Commands::Watch(cmd) => cmd.run(ctx)?,
        Commands::Remind(cmd) => cmd.run(ctx)?,
        // Handled before the store is opened
        Commands::Config(_) => {}
    }
    Ok(())
}

/// Commands that read or edit the collections start from the server's
/// latest snapshot when it is reachable.
fn pulls_before_running(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Production(_)
            | Commands::Sale(_)
            | Commands::Client(_)
            | Commands::Settings(_)
            | Commands::Stats(_)
            | Commands::Report(_)
    )
}
