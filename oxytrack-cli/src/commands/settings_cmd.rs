use clap::{Args, Subcommand};

use oxytrack_core::SettingsPatch;

use super::OutputFormat;
use crate::context::AppContext;

#[derive(Args)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show application settings
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change application settings
    Set {
        /// Producer used when none is given
        #[arg(long)]
        default_producer: Option<String>,

        /// Company name shown in reports
        #[arg(long)]
        company_name: Option<String>,
    },
}

impl SettingsCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SettingsSubcommand::Show { format } => {
                let settings = ctx.store.settings();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
                    OutputFormat::Text => {
                        println!("default_producer: {}", settings.default_producer);
                        println!("company_name:     {}", settings.company_name);
                    }
                }
                Ok(())
            }

            SettingsSubcommand::Set {
                default_producer,
                company_name,
            } => {
                let patch = SettingsPatch {
                    default_producer: non_blank(default_producer),
                    company_name: non_blank(company_name),
                };
                if patch.is_empty() {
                    return Err("Nothing to change. Use --default-producer or --company-name.".into());
                }

                let settings = ctx.store.update_settings(patch)?;
                println!("Settings updated:");
                println!("  default_producer: {}", settings.default_producer);
                println!("  company_name:     {}", settings.company_name);
                Ok(())
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
