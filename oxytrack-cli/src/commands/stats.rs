use clap::{Args, Subcommand};

use oxytrack_core::stats::{available_months, daily_breakdown};
use oxytrack_core::{DashboardStats, YearMonth};

use super::OutputFormat;
use crate::context::AppContext;

#[derive(Args)]
pub struct StatsCommand {
    #[command(subcommand)]
    pub command: StatsSubcommand,
}

#[derive(Subcommand)]
pub enum StatsSubcommand {
    /// Overall figures and this month's production by day
    Dashboard {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Daily breakdown for one month
    Month {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<YearMonth>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Months that have a breakdown
    Months,
}

impl StatsCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let productions = ctx.store.production_entries();
        let sales = ctx.store.sale_entries();

        match &self.command {
            StatsSubcommand::Dashboard { format } => {
                let stats = DashboardStats::compute(&productions, &sales);
                let days = daily_breakdown(&productions, YearMonth::current());
                match format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({ "stats": stats, "currentMonth": days });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        let title = format!("{} - Tableau de bord", ctx.store.settings().company_name);
                        println!("{}", title);
                        println!("{}", "=".repeat(title.chars().count()));
                        println!();
                        println!("Bottles produced:    {}", stats.total_bottles_produced);
                        println!("Production hours:    {}h", stats.total_production_hours);
                        println!("Average pressure:    {:.1} bar", stats.average_pressure);
                        println!("Bottles sold:        {}", stats.total_our_bottles_sold);
                        println!("Pending recoveries:  {}", stats.pending_recoveries);

                        if !days.is_empty() {
                            println!();
                            println!("{}", YearMonth::current().label());
                            println!("{:>4}  {:>8}  {:>11}", "Day", "Hôpital", "Entreprises");
                            for d in &days {
                                println!(
                                    "{:>4}  {:>8}  {:>11}",
                                    d.day, d.hospital_bottles, d.company_bottles
                                );
                            }
                        }
                    }
                }
                Ok(())
            }

            StatsSubcommand::Month { month, format } => {
                let month = month.unwrap_or_else(YearMonth::current);
                let days = daily_breakdown(&productions, month);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&days)?),
                    OutputFormat::Text => {
                        if days.is_empty() {
                            println!("No completed production in {}.", month.label());
                            return Ok(());
                        }
                        println!("{}", month.label());
                        println!("{:>4}  {:>9}  {:>7}  {:>9}", "Day", "Bottles", "Hours", "Pressure");
                        println!("{}", "-".repeat(35));
                        for d in &days {
                            println!(
                                "{:>4}  {:>9}  {:>7.2}  {:>9.1}",
                                d.day, d.bottles, d.hours, d.average_pressure
                            );
                        }
                    }
                }
                Ok(())
            }

            StatsSubcommand::Months => {
                let dates = productions.iter().map(|p| p.production_date);
                for month in available_months(dates, YearMonth::current()) {
                    println!("{}  {}", month, month.label());
                }
                Ok(())
            }
        }
    }
}
