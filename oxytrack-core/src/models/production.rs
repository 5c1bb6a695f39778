use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::timestamp::{self, iso, iso_option, IN_PROGRESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionStatus {
    #[serde(rename = "en-cours")]
    InProgress,
    #[serde(rename = "terminee")]
    Completed,
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionStatus::InProgress => write!(f, "in progress"),
            ProductionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Where the bottles of a completed run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BottleDestination {
    #[serde(rename = "hopital")]
    Hospital,
    #[serde(rename = "hopital-entreprises")]
    HospitalAndCompanies,
}

impl BottleDestination {
    /// True when part of the run goes to a secondary (company) client.
    pub fn includes_secondary_client(&self) -> bool {
        matches!(self, BottleDestination::HospitalAndCompanies)
    }
}

impl fmt::Display for BottleDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BottleDestination::Hospital => write!(f, "hopital"),
            BottleDestination::HospitalAndCompanies => write!(f, "hopital-entreprises"),
        }
    }
}

impl FromStr for BottleDestination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hopital" | "hospital" => Ok(BottleDestination::Hospital),
            "hopital-entreprises" | "hospital-companies" => {
                Ok(BottleDestination::HospitalAndCompanies)
            }
            _ => Err(format!(
                "Invalid destination '{}'. Valid options: hopital, hopital-entreprises",
                s
            )),
        }
    }
}

/// One production run of the oxygen plant.
///
/// `status` and `duration` are derived from `end_time`; change it through
/// [`ProductionEntry::set_end_time`] so the three stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntry {
    pub id: String,
    #[serde(with = "iso")]
    pub production_date: DateTime<Utc>,
    #[serde(with = "iso")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso_option", default)]
    pub booster_time: Option<DateTime<Utc>>,
    #[serde(with = "iso_option", default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration: String,
    pub source: String,
    #[serde(default)]
    pub bottles_produced: u32,
    #[serde(default)]
    pub pressure: Option<f64>,
    pub producer: String,
    #[serde(default)]
    pub observations: String,
    pub status: ProductionStatus,
    #[serde(default)]
    pub bottle_destination: Option<BottleDestination>,
    #[serde(default)]
    pub other_client_name: Option<String>,
    #[serde(default)]
    pub other_client_bottles_count: Option<u32>,
    #[serde(with = "iso", default = "timestamp::epoch")]
    pub updated_at: DateTime<Utc>,
}

impl ProductionEntry {
    /// Starts a new run: in progress, no end time, nothing produced yet.
    pub fn start(
        production_date: DateTime<Utc>,
        start_time: DateTime<Utc>,
        source: impl Into<String>,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            production_date,
            start_time,
            booster_time: None,
            end_time: None,
            duration: IN_PROGRESS.to_string(),
            source: source.into(),
            bottles_produced: 0,
            pressure: None,
            producer: producer.into(),
            observations: String::new(),
            status: ProductionStatus::InProgress,
            bottle_destination: None,
            other_client_name: None,
            other_client_bottles_count: None,
            updated_at: timestamp::now(),
        }
    }

    pub fn with_booster_time(mut self, booster_time: Option<DateTime<Utc>>) -> Self {
        self.booster_time = booster_time;
        self
    }

    /// Sets the end time and recomputes status and duration.
    pub fn set_end_time(&mut self, end_time: Option<DateTime<Utc>>) {
        self.end_time = end_time;
        match self.duration_millis() {
            Some(millis) => {
                self.status = ProductionStatus::Completed;
                self.duration = timestamp::format_duration(millis);
            }
            None => {
                self.status = ProductionStatus::InProgress;
                self.duration = IN_PROGRESS.to_string();
            }
        }
    }

    /// Re-establishes the status/duration invariant on a document that came
    /// from outside (cache or remote).
    pub fn normalized(mut self) -> Self {
        self.set_end_time(self.end_time);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProductionStatus::Completed
    }

    /// Milliseconds between start and end, if the run has ended.
    pub fn duration_millis(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    /// Number of bottles sent to a secondary client, zero when there is none.
    pub fn secondary_bottles(&self) -> u32 {
        self.other_client_bottles_count.unwrap_or(0)
    }

    pub fn has_secondary_client(&self) -> bool {
        self.secondary_bottles() > 0
    }

    /// Bottles produced for the hospital plus those for the secondary client.
    pub fn total_bottles(&self) -> u32 {
        self.bottles_produced + self.secondary_bottles()
    }

    /// Bumps the revision timestamp.
    pub fn touch(&mut self) {
        self.updated_at = timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    #[test]
    fn test_start_is_in_progress() {
        let entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");

        assert_eq!(entry.status, ProductionStatus::InProgress);
        assert_eq!(entry.duration, "En cours");
        assert!(entry.end_time.is_none());
        assert_eq!(entry.bottles_produced, 0);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_set_end_time_completes() {
        let mut entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");
        entry.set_end_time(Some(at(16, 30)));

        assert_eq!(entry.status, ProductionStatus::Completed);
        assert_eq!(entry.duration, "8h 30m");
        assert_eq!(entry.duration_millis(), Some(8 * 3_600_000 + 30 * 60_000));
    }

    #[test]
    fn test_clearing_end_time_reverts_to_in_progress() {
        let mut entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");
        entry.set_end_time(Some(at(9, 0)));
        entry.set_end_time(None);

        assert_eq!(entry.status, ProductionStatus::InProgress);
        assert_eq!(entry.duration, "En cours");
    }

    #[test]
    fn test_normalized_repairs_inconsistent_document() {
        let mut entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");
        entry.end_time = Some(at(10, 15));
        entry.status = ProductionStatus::InProgress;
        entry.duration = "bogus".to_string();

        let entry = entry.normalized();
        assert_eq!(entry.status, ProductionStatus::Completed);
        assert_eq!(entry.duration, "2h 15m");
    }

    #[test]
    fn test_total_bottles_includes_secondary_client() {
        let mut entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");
        entry.bottles_produced = 40;
        assert_eq!(entry.total_bottles(), 40);
        assert!(!entry.has_secondary_client());

        entry.other_client_bottles_count = Some(10);
        assert_eq!(entry.total_bottles(), 50);
        assert!(entry.has_secondary_client());
    }

    #[test]
    fn test_destination_from_str() {
        assert_eq!(
            BottleDestination::from_str("hopital").unwrap(),
            BottleDestination::Hospital
        );
        assert_eq!(
            BottleDestination::from_str("HOPITAL-ENTREPRISES").unwrap(),
            BottleDestination::HospitalAndCompanies
        );
        assert!(BottleDestination::from_str("warehouse").is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut entry = ProductionEntry::start(at(0, 0), at(8, 0), "snel", "A");
        entry.set_end_time(Some(at(16, 30)));
        entry.bottle_destination = Some(BottleDestination::HospitalAndCompanies);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["status"], "terminee");
        assert_eq!(value["startTime"], "2025-06-02T08:00:00.000Z");
        assert_eq!(value["endTime"], "2025-06-02T16:30:00.000Z");
        assert_eq!(value["boosterTime"], serde_json::Value::Null);
        assert_eq!(value["bottleDestination"], "hopital-entreprises");

        let parsed: ProductionEntry = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_missing_revision_defaults_to_epoch() {
        let json = r#"{
            "id": "1717315200000",
            "productionDate": "2025-06-02T00:00:00.000Z",
            "startTime": "2025-06-02T08:00:00.000Z",
            "duration": "En cours",
            "source": "snel",
            "producer": "A",
            "status": "en-cours"
        }"#;
        let entry: ProductionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.updated_at, timestamp::epoch());
        assert!(entry.pressure.is_none());
        assert!(entry.observations.is_empty());
    }
}
