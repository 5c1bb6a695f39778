//! Production run lifecycle: start, complete, delete.

use chrono::{DateTime, Utc};

use crate::models::{BottleDestination, ClientType, ProductionEntry, SaleEntry};
use crate::store::{StoreError, StoreResult, SyncStore};
use crate::validation::{
    normalize_observations, resolve_source, validate_producer, validate_secondary_client,
    validate_time_order, ValidationResult,
};

/// Fields entered when a run starts.
#[derive(Debug, Clone)]
pub struct StartProduction {
    pub production_date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub booster_time: Option<DateTime<Utc>>,
    /// One of `groupe`, `snel`, `socodee` or `autre`.
    pub source: String,
    /// Free-text source, required when `source` is `autre`.
    pub source_other: Option<String>,
    pub producer: String,
}

impl StartProduction {
    pub fn into_entry(self) -> ValidationResult<ProductionEntry> {
        let source = resolve_source(&self.source, self.source_other.as_deref())?;
        let producer = validate_producer(&self.producer)?;

        Ok(
            ProductionEntry::start(self.production_date, self.start_time, source, producer)
                .with_booster_time(self.booster_time),
        )
    }
}

/// Closing fields of a run.
#[derive(Debug, Clone)]
pub struct CompleteProduction {
    pub end_time: DateTime<Utc>,
    pub bottles_produced: u32,
    pub pressure: Option<f64>,
    pub observations: String,
    pub destination: BottleDestination,
    pub other_client_name: Option<String>,
    pub other_client_bottles_count: Option<u32>,
}

/// Outcome of completing a run.
#[derive(Debug, Clone)]
pub struct CompletedProduction {
    pub entry: ProductionEntry,
    /// Sale recorded for the secondary client, if one was created.
    pub sale: Option<SaleEntry>,
}

/// Applies the closing fields to `entry`.
///
/// Returns the pending company sale to record when the run newly sends
/// bottles to a secondary client. An entry that already had a secondary
/// client never produces a second sale.
pub fn apply_completion(
    entry: &mut ProductionEntry,
    form: CompleteProduction,
) -> ValidationResult<Option<SaleEntry>> {
    validate_time_order(entry.start_time, form.end_time)?;
    let (other_client_name, other_client_bottles_count) = validate_secondary_client(
        form.destination,
        form.other_client_name.as_deref(),
        form.other_client_bottles_count,
    )?;

    let had_secondary_client = entry.has_secondary_client();

    entry.set_end_time(Some(form.end_time));
    entry.bottles_produced = form.bottles_produced;
    entry.pressure = form.pressure;
    entry.observations = normalize_observations(&form.observations);
    entry.bottle_destination = Some(form.destination);
    entry.other_client_name = other_client_name;
    entry.other_client_bottles_count = other_client_bottles_count;
    entry.touch();

    if had_secondary_client || !entry.has_secondary_client() {
        return Ok(None);
    }

    Ok(entry.other_client_name.as_ref().map(|name| {
        SaleEntry::new(
            entry.production_date,
            ClientType::Company,
            name.clone(),
            entry.secondary_bottles(),
        )
    }))
}

impl SyncStore {
    /// Validates the form and appends a new in-progress run.
    pub fn start_production(&self, form: StartProduction) -> StoreResult<ProductionEntry> {
        let entry = form.into_entry()?;
        let created = entry.clone();

        self.try_modify(move |entries: &mut Vec<ProductionEntry>| {
            entries.push(entry);
            Ok(())
        })?;

        tracing::info!("Started production {} ({})", created.id, created.source);
        Ok(created)
    }

    /// Completes a run and, when part of it went to a new secondary client,
    /// records the matching pending sale.
    pub fn complete_production(
        &self,
        id: &str,
        form: CompleteProduction,
    ) -> StoreResult<CompletedProduction> {
        let (entry, sale) = self.try_modify(|entries: &mut Vec<ProductionEntry>| {
            let entry = entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::ProductionNotFound(id.to_string()))?;
            let sale = apply_completion(entry, form)?;
            Ok((entry.clone(), sale))
        })?;

        if let Some(sale) = &sale {
            let created = sale.clone();
            self.try_modify(move |sales: &mut Vec<SaleEntry>| {
                sales.push(created);
                Ok(())
            })?;
            tracing::info!(
                "Recorded {} bottles for {} from production {}",
                sale.our_bottles_count,
                sale.client_name,
                entry.id
            );
        }

        tracing::info!("Completed production {} ({})", entry.id, entry.duration);
        Ok(CompletedProduction { entry, sale })
    }

    /// Runs that have not been completed yet, newest first.
    pub fn in_progress_productions(&self) -> Vec<ProductionEntry> {
        self.production_entries()
            .into_iter()
            .filter(|e| !e.is_completed())
            .collect()
    }
}
