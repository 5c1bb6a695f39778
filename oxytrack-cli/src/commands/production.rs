use clap::{Args, Subcommand};

use oxytrack_core::{
    BottleDestination, CompleteProduction, ProductionEntry, StartProduction, SyncStore,
};

use super::{resolve_id, OutputFormat};
use crate::context::AppContext;
use crate::input::{calendar_date, clock, day, end_instant, local_instant, parse_date, parse_time};

#[derive(Args)]
pub struct ProductionCommand {
    #[command(subcommand)]
    pub command: ProductionSubcommand,
}

#[derive(Subcommand)]
pub enum ProductionSubcommand {
    /// Start a production run
    Start {
        /// Production date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Start time (HH:MM), defaults to now
        #[arg(long)]
        start: Option<String>,

        /// Booster start time (HH:MM)
        #[arg(long)]
        booster: Option<String>,

        /// Energy source: groupe, snel, socodee or autre
        #[arg(long, short)]
        source: String,

        /// Source name when --source is autre
        #[arg(long)]
        other_source: Option<String>,

        /// Producer name, defaults to the configured default producer
        #[arg(long, short)]
        producer: Option<String>,
    },

    /// Complete a production run
    Complete {
        /// Production ID (or unique prefix)
        id: String,

        /// End time (HH:MM), defaults to now
        #[arg(long)]
        end: Option<String>,

        /// Bottles produced for the hospital
        #[arg(long, short)]
        bottles: u32,

        /// Pressure reading in bar
        #[arg(long)]
        pressure: Option<f64>,

        /// Observations (defaults to RAS)
        #[arg(long, short, default_value = "")]
        observations: String,

        /// Destination: hopital or hopital-entreprises
        #[arg(long, default_value = "hopital")]
        destination: BottleDestination,

        /// Secondary client name
        #[arg(long)]
        client: Option<String>,

        /// Bottles for the secondary client
        #[arg(long)]
        client_bottles: Option<u32>,
    },

    /// List production runs
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only runs that are still in progress
        #[arg(long)]
        in_progress: bool,
    },

    /// Show a production run
    Show {
        /// Production ID (or unique prefix)
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a production run
    Delete {
        /// Production ID (or unique prefix)
        id: String,
    },
}

impl ProductionCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let store = &ctx.store;
        match &self.command {
            ProductionSubcommand::Start {
                date,
                start,
                booster,
                source,
                other_source,
                producer,
            } => {
                let date = parse_date(date.as_deref())?;
                let start_time = local_instant(date, parse_time(start.as_deref())?)?;
                let booster_time = match booster {
                    Some(b) => Some(local_instant(date, parse_time(Some(b))?)?),
                    None => None,
                };
                let producer = producer
                    .clone()
                    .unwrap_or_else(|| store.settings().default_producer);

                let entry = store.start_production(StartProduction {
                    production_date: calendar_date(date),
                    start_time,
                    booster_time,
                    source: source.clone(),
                    source_other: other_source.clone(),
                    producer,
                })?;

                println!("Started production:");
                println!();
                print_entry(&entry);
                Ok(())
            }

            ProductionSubcommand::Complete {
                id,
                end,
                bottles,
                pressure,
                observations,
                destination,
                client,
                client_bottles,
            } => {
                let id = find_id(store, id)?;
                let entry = store
                    .production_entry(&id)
                    .ok_or_else(|| format!("Production not found: {}", id))?;

                let end_time = match end {
                    Some(t) => end_instant(&entry.start_time, parse_time(Some(t))?)?,
                    None => oxytrack_core::timestamp::now(),
                };

                let completed = store.complete_production(
                    &id,
                    CompleteProduction {
                        end_time,
                        bottles_produced: *bottles,
                        pressure: *pressure,
                        observations: observations.clone(),
                        destination: *destination,
                        other_client_name: client.clone(),
                        other_client_bottles_count: *client_bottles,
                    },
                )?;

                println!("Completed production:");
                println!();
                print_entry(&completed.entry);
                if let Some(sale) = &completed.sale {
                    println!();
                    println!(
                        "Recorded pending sale of {} bottle(s) to {} ({})",
                        sale.our_bottles_count, sale.client_name, sale.id
                    );
                }
                Ok(())
            }

            ProductionSubcommand::List {
                format,
                in_progress,
            } => {
                let entries = if *in_progress {
                    store.in_progress_productions()
                } else {
                    store.production_entries()
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        if entries.is_empty() {
                            println!("No production runs found.");
                            return Ok(());
                        }
                        println!(
                            "{:<8}  {:<10}  {:<5}  {:<5}  {:<10}  {:>9}  {:>8}  {:<10}  Producer",
                            "ID", "Date", "Start", "End", "Duration", "Bottles", "Pressure", "Source"
                        );
                        println!("{}", "-".repeat(96));
                        for e in &entries {
                            let end = e.end_time.as_ref().map(clock).unwrap_or_else(|| "-".into());
                            let pressure = e
                                .pressure
                                .map(|p| format!("{} bar", p))
                                .unwrap_or_else(|| "-".into());
                            println!(
                                "{:<8}  {:<10}  {:<5}  {:<5}  {:<10}  {:>9}  {:>8}  {:<10}  {}",
                                short_id(&e.id),
                                day(&e.production_date),
                                clock(&e.start_time),
                                end,
                                e.duration,
                                e.total_bottles(),
                                pressure,
                                e.source.to_uppercase(),
                                e.producer
                            );
                        }
                        println!("\nTotal: {} run(s)", entries.len());
                    }
                }
                Ok(())
            }

            ProductionSubcommand::Show { id, format } => {
                let id = find_id(store, id)?;
                let entry = store
                    .production_entry(&id)
                    .ok_or_else(|| format!("Production not found: {}", id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
                    OutputFormat::Text => print_entry(&entry),
                }
                Ok(())
            }

            ProductionSubcommand::Delete { id } => {
                let id = find_id(store, id)?;
                if store.delete_production_entry(&id)? {
                    println!("Deleted production: {}", id);
                    Ok(())
                } else {
                    Err(format!("Production not found: {}", id).into())
                }
            }
        }
    }
}

fn find_id(store: &SyncStore, id: &str) -> Result<String, String> {
    let ids: Vec<String> = store.production_entries().into_iter().map(|e| e.id).collect();
    resolve_id(&ids, id, "Production")
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_entry(entry: &ProductionEntry) {
    println!("  Date:      {}", day(&entry.production_date));
    println!("  Status:    {}", entry.status);
    println!("  Source:    {}", entry.source.to_uppercase());
    println!("  Producer:  {}", entry.producer);
    println!("  Start:     {}", clock(&entry.start_time));
    if let Some(booster) = &entry.booster_time {
        println!("  Booster:   {}", clock(booster));
    }
    if let Some(end) = &entry.end_time {
        println!("  End:       {}", clock(end));
    }
    println!("  Duration:  {}", entry.duration);
    if entry.is_completed() {
        println!("  Bottles:   {}", entry.bottles_produced);
        if let (Some(name), true) = (&entry.other_client_name, entry.has_secondary_client()) {
            println!("  Client:    {} ({} bottles)", name, entry.secondary_bottles());
            println!("  Total:     {}", entry.total_bottles());
        }
        if let Some(pressure) = entry.pressure {
            println!("  Pressure:  {} bar", pressure);
        }
        println!("  Notes:     {}", entry.observations);
    }
    println!();
    println!("Production ID: {}", entry.id);
}
