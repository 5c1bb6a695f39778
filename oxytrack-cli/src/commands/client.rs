use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::context::AppContext;

#[derive(Args)]
pub struct ClientCommand {
    #[command(subcommand)]
    pub command: ClientSubcommand,
}

#[derive(Subcommand)]
pub enum ClientSubcommand {
    /// List client names used in sales
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a client on every sale
    Rename {
        /// Current name
        old: String,

        /// New name
        new: String,
    },
}

impl ClientCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ClientSubcommand::List { format } => {
                let names = ctx.store.client_names();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                    OutputFormat::Text => {
                        if names.is_empty() {
                            println!("No clients found.");
                        }
                        for name in &names {
                            println!("{}", name);
                        }
                    }
                }
                Ok(())
            }

            ClientSubcommand::Rename { old, new } => {
                let renamed = ctx.store.rename_client(old, new)?;
                if renamed == 0 {
                    return Err(format!("Client not found: {}", old).into());
                }
                println!("Renamed '{}' to '{}' on {} sale(s)", old, new.trim(), renamed);
                Ok(())
            }
        }
    }
}
