use clap::Args;
use std::fs;
use std::path::PathBuf;

use oxytrack_core::{MonthlyReport, YearMonth};

use super::OutputFormat;
use crate::context::AppContext;

/// Build the monthly activity report
#[derive(Args)]
pub struct ReportCommand {
    /// Month (YYYY-MM), defaults to the current month
    #[arg(long, short)]
    month: Option<YearMonth>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report into this directory instead of printing it
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl ReportCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let month = self.month.unwrap_or_else(YearMonth::current);
        let settings = ctx.store.settings();
        let report = MonthlyReport::build(
            &settings.company_name,
            month,
            &ctx.store.production_entries(),
            &ctx.store.sale_entries(),
        );

        let (contents, extension) = match self.format {
            OutputFormat::Json => (serde_json::to_string_pretty(&report)? + "\n", "json"),
            OutputFormat::Text => (report.to_string(), "txt"),
        };

        match &self.output {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.{}", report.file_name(), extension));
                fs::write(&path, contents)?;
                println!("Report written to {}", path.display());
            }
            None => print!("{}", contents),
        }
        Ok(())
    }
}
