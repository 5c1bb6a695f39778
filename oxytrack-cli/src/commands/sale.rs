use clap::{Args, Subcommand};

use oxytrack_core::sale::filter_sales;
use oxytrack_core::{ClientType, SaleEntry, SaleForm, SyncStore};

use super::{resolve_id, OutputFormat};
use crate::context::AppContext;
use crate::input::{calendar_date, day, parse_date};

#[derive(Args)]
pub struct SaleCommand {
    #[command(subcommand)]
    pub command: SaleSubcommand,
}

/// Fields shared by `add` and `update`
#[derive(Args)]
pub struct SaleFields {
    /// Client name
    #[arg(long, short)]
    client: String,

    /// Client type: hopital or entreprise
    #[arg(long = "type", short = 't', value_name = "TYPE", default_value = "hopital")]
    client_type: ClientType,

    /// Person who received the bottles (required for hospitals)
    #[arg(long, short, default_value = "")]
    recipient: String,

    /// Sale date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    date: Option<String>,

    /// Our bottles delivered
    #[arg(long, short)]
    bottles: u32,

    /// Client bottles received in exchange
    #[arg(long, default_value_t = 0)]
    client_bottles: u32,

    /// Bottle serial numbers
    #[arg(long, default_value = "")]
    numbers: String,
}

impl SaleFields {
    fn to_form(&self) -> Result<SaleForm, String> {
        Ok(SaleForm {
            sale_date: calendar_date(parse_date(self.date.as_deref())?),
            client_type: self.client_type,
            client_name: self.client.clone(),
            recipient_name: self.recipient.clone(),
            our_bottles_count: self.bottles,
            client_bottles_count: self.client_bottles,
            bottle_numbers: self.numbers.clone(),
        })
    }
}

#[derive(Subcommand)]
pub enum SaleSubcommand {
    /// Record a sale
    Add(SaleFields),

    /// Replace the details of a sale
    Update {
        /// Sale ID (or unique prefix)
        id: String,

        #[command(flatten)]
        fields: SaleFields,
    },

    /// Mark the client's bottles as recovered
    Recover {
        /// Sale ID (or unique prefix)
        id: String,
    },

    /// List sales
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only sales awaiting bottle recovery
        #[arg(long, conflicts_with = "completed")]
        pending: bool,

        /// Only sales whose bottles were recovered
        #[arg(long)]
        completed: bool,
    },

    /// Delete a sale
    Delete {
        /// Sale ID (or unique prefix)
        id: String,
    },
}

impl SaleCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let store = &ctx.store;
        match &self.command {
            SaleSubcommand::Add(fields) => {
                let sale = store.record_sale(fields.to_form()?)?;
                println!("Recorded sale:");
                println!();
                print_sale(&sale);
                Ok(())
            }

            SaleSubcommand::Update { id, fields } => {
                let id = find_id(store, id)?;
                let sale = store.update_sale(&id, fields.to_form()?)?;
                println!("Updated sale:");
                println!();
                print_sale(&sale);
                Ok(())
            }

            SaleSubcommand::Recover { id } => {
                let id = find_id(store, id)?;
                let sale = store.mark_recovered(&id)?;
                println!(
                    "Bottles recovered from {} ({} bottle(s))",
                    sale.client_name, sale.our_bottles_count
                );
                Ok(())
            }

            SaleSubcommand::List {
                format,
                pending,
                completed,
            } => {
                let all = store.sale_entries();
                let sales = match (*pending, *completed) {
                    (true, _) => filter_sales(&all, false),
                    (_, true) => filter_sales(&all, true),
                    _ => all,
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&sales)?);
                    }
                    OutputFormat::Text => {
                        if sales.is_empty() {
                            println!("No sales found.");
                            return Ok(());
                        }
                        let company = store.settings().company_name;
                        println!(
                            "{:<8}  {:<10}  {:<24}  {:<18}  {:>6}  {:>6}  Status",
                            "ID", "Date", "Client", "Recipient", "Ours", "Theirs"
                        );
                        println!("{}", "-".repeat(92));
                        for s in &sales {
                            let recipient = if s.recipient_name.is_empty() {
                                "-"
                            } else {
                                s.recipient_name.as_str()
                            };
                            println!(
                                "{:<8}  {:<10}  {:<24}  {:<18}  {:>6}  {:>6}  {}",
                                s.id.get(..8).unwrap_or(&s.id),
                                day(&s.sale_date),
                                s.client_name,
                                recipient,
                                s.our_bottles_count,
                                s.client_bottles_count,
                                s.status.label()
                            );
                        }
                        let ours: u32 = sales.iter().map(|s| s.our_bottles_count).sum();
                        println!("\nTotal: {} sale(s), {} {} bottle(s)", sales.len(), ours, company);
                    }
                }
                Ok(())
            }

            SaleSubcommand::Delete { id } => {
                let id = find_id(store, id)?;
                if store.delete_sale_entry(&id)? {
                    println!("Deleted sale: {}", id);
                    Ok(())
                } else {
                    Err(format!("Sale not found: {}", id).into())
                }
            }
        }
    }
}

fn find_id(store: &SyncStore, id: &str) -> Result<String, String> {
    let ids: Vec<String> = store.sale_entries().into_iter().map(|s| s.id).collect();
    resolve_id(&ids, id, "Sale")
}

fn print_sale(sale: &SaleEntry) {
    println!("  Date:       {}", day(&sale.sale_date));
    println!("  Client:     {} ({})", sale.client_name, sale.client_type);
    if !sale.recipient_name.is_empty() {
        println!("  Recipient:  {}", sale.recipient_name);
    }
    println!("  Bottles:    {}", sale.our_bottles_count);
    if sale.client_bottles_count > 0 {
        println!("  Received:   {}", sale.client_bottles_count);
    }
    if !sale.bottle_numbers.is_empty() {
        println!("  Numbers:    {}", sale.bottle_numbers);
    }
    println!("  Status:     {}", sale.status.label());
    println!();
    println!("Sale ID: {}", sale.id);
}
