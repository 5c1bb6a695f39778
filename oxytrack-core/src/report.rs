//! Monthly activity report.

use serde::Serialize;
use std::fmt;

use crate::models::{ProductionEntry, SaleEntry};
use crate::stats::{productions_in_month, sales_in_month, DashboardStats, YearMonth};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub company_name: String,
    pub month: String,
    pub label: String,
    pub summary: DashboardStats,
    /// Completed runs only.
    pub productions: Vec<ProductionEntry>,
    pub sales: Vec<SaleEntry>,
}

impl MonthlyReport {
    pub fn build(
        company_name: &str,
        month: YearMonth,
        productions: &[ProductionEntry],
        sales: &[SaleEntry],
    ) -> Self {
        let mut productions = productions_in_month(productions, month);
        let mut sales = sales_in_month(sales, month);
        productions.sort_by_key(|p| (p.production_date, p.start_time));
        sales.sort_by_key(|s| s.sale_date);

        Self {
            company_name: company_name.to_string(),
            month: month.to_string(),
            label: month.label(),
            summary: DashboardStats::for_month(month, &productions, &sales),
            productions,
            sales,
        }
    }

    /// Base file name, e.g. `Rapport_OxyTrack_juin_2025`.
    pub fn file_name(&self) -> String {
        format!("Rapport_OxyTrack_{}", self.label.replace(' ', "_"))
    }
}

impl fmt::Display for MonthlyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("Rapport d'Activité - {}", self.company_name);
        writeln!(f, "{}", title)?;
        writeln!(f, "Mois: {}", self.label)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;
        writeln!(f)?;

        let s = &self.summary;
        writeln!(f, "Bouteilles produites: {}", s.total_bottles_produced)?;
        writeln!(f, "Heures de production: {}h", s.total_production_hours)?;
        writeln!(f, "Pression moyenne:     {:.1} bar", s.average_pressure)?;
        writeln!(f, "Bouteilles vendues:   {}", s.total_our_bottles_sold)?;

        if !self.productions.is_empty() {
            writeln!(f)?;
            writeln!(f, "Détails de la Production")?;
            writeln!(
                f,
                "{:<10}  {:<8}  {:>10}  {:>10}  {:<10}  Producteur",
                "Date", "Durée", "Bouteilles", "Pression", "Source"
            )?;
            for p in &self.productions {
                let pressure = p
                    .pressure
                    .map(|v| format!("{} bar", v))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "{:<10}  {:<8}  {:>10}  {:>10}  {:<10}  {}",
                    p.production_date.format("%d/%m/%Y"),
                    p.duration,
                    p.total_bottles(),
                    pressure,
                    p.source.to_uppercase(),
                    p.producer
                )?;
            }
        }

        if !self.sales.is_empty() {
            writeln!(f)?;
            writeln!(f, "Détails des Ventes")?;
            writeln!(
                f,
                "{:<10}  {:<20}  {:<16}  {:>6}  {:>6}  Statut",
                "Date", "Client", "Réceptionnaire", "Nous", "Client"
            )?;
            for s in &self.sales {
                let recipient = if s.recipient_name.is_empty() { "-" } else { &s.recipient_name };
                let client_bottles = if s.client_bottles_count == 0 {
                    "-".to_string()
                } else {
                    s.client_bottles_count.to_string()
                };
                writeln!(
                    f,
                    "{:<10}  {:<20}  {:<16}  {:>6}  {:>6}  {}",
                    s.sale_date.format("%d/%m/%Y"),
                    s.client_name,
                    recipient,
                    s.our_bottles_count,
                    client_bottles,
                    s.status.label()
                )?;
            }
        }

        Ok(())
    }
}
