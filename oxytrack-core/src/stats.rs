//! Dashboard figures and per-month breakdowns.
//!
//! Everything here is computed from store snapshots; nothing is persisted.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{ProductionEntry, SaleEntry, SaleStatus};
use crate::timestamp;

const MONTH_NAMES: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

/// A calendar month. Entries are assigned to months by their UTC date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: &DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(&timestamp::now())
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        *self == Self::of(date)
    }

    /// French month name, lowercase.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// Label such as `juin 2025`.
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid month '{}'. Expected YYYY-MM", s);
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Every month from January of the earliest date's year through December of
/// `current`'s year, newest first. With no dates, only `current`.
pub fn available_months<I>(dates: I, current: YearMonth) -> Vec<YearMonth>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let Some(earliest) = dates.into_iter().min() else {
        return vec![current];
    };

    let first_year = earliest.year().min(current.year);
    (first_year..=current.year)
        .rev()
        .flat_map(|year| (1..=12).rev().map(move |month| YearMonth { year, month }))
        .collect()
}

/// Summary figures over completed productions and a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bottles_produced: u32,
    /// Whole hours, rounded down after summing.
    pub total_production_hours: i64,
    /// Mean over entries with a positive pressure reading; zero when none.
    pub average_pressure: f64,
    pub total_our_bottles_sold: u32,
    pub pending_recoveries: usize,
}

impl DashboardStats {
    pub fn compute(productions: &[ProductionEntry], sales: &[SaleEntry]) -> Self {
        let completed: Vec<&ProductionEntry> = productions.iter().filter(|p| p.is_completed()).collect();

        let total_bottles_produced = completed.iter().map(|p| p.total_bottles()).sum();
        let total_millis: i64 = completed.iter().filter_map(|p| p.duration_millis()).sum();

        let pressures: Vec<f64> = completed
            .iter()
            .filter_map(|p| p.pressure)
            .filter(|&p| p > 0.0)
            .collect();
        let average_pressure = if pressures.is_empty() {
            0.0
        } else {
            pressures.iter().sum::<f64>() / pressures.len() as f64
        };

        Self {
            total_bottles_produced,
            total_production_hours: timestamp::whole_hours(total_millis),
            average_pressure,
            total_our_bottles_sold: sales.iter().map(|s| s.our_bottles_count).sum(),
            pending_recoveries: sales.iter().filter(|s| s.status == SaleStatus::Pending).count(),
        }
    }

    /// Figures restricted to one month.
    pub fn for_month(month: YearMonth, productions: &[ProductionEntry], sales: &[SaleEntry]) -> Self {
        Self::compute(
            &productions_in_month(productions, month),
            &sales_in_month(sales, month),
        )
    }
}

/// Completed productions whose production date falls in `month`.
pub fn productions_in_month(productions: &[ProductionEntry], month: YearMonth) -> Vec<ProductionEntry> {
    productions
        .iter()
        .filter(|p| p.is_completed() && month.contains(&p.production_date))
        .cloned()
        .collect()
}

pub fn sales_in_month(sales: &[SaleEntry], month: YearMonth) -> Vec<SaleEntry> {
    sales
        .iter()
        .filter(|s| month.contains(&s.sale_date))
        .cloned()
        .collect()
}

/// One day of a monthly breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub day: u32,
    /// Hospital plus secondary-client bottles.
    pub bottles: u32,
    pub hospital_bottles: u32,
    pub company_bottles: u32,
    /// Rounded to two decimals.
    pub hours: f64,
    /// Rounded to one decimal; zero when no reading was taken.
    pub average_pressure: f64,
}

#[derive(Default)]
struct DayTotals {
    hospital_bottles: u32,
    company_bottles: u32,
    millis: i64,
    pressure_sum: f64,
    pressure_count: u32,
}

/// Per-day figures for the completed productions of `month`, by day.
/// Days without a completed run are omitted.
pub fn daily_breakdown(productions: &[ProductionEntry], month: YearMonth) -> Vec<DailyStats> {
    let mut days: BTreeMap<u32, DayTotals> = BTreeMap::new();

    for entry in productions_in_month(productions, month) {
        let totals = days.entry(entry.production_date.day()).or_default();
        totals.hospital_bottles += entry.bottles_produced;
        totals.company_bottles += entry.secondary_bottles();
        totals.millis += entry.duration_millis().unwrap_or(0);
        if let Some(pressure) = entry.pressure.filter(|&p| p > 0.0) {
            totals.pressure_sum += pressure;
            totals.pressure_count += 1;
        }
    }

    days.into_iter()
        .map(|(day, t)| DailyStats {
            day,
            bottles: t.hospital_bottles + t.company_bottles,
            hospital_bottles: t.hospital_bottles,
            company_bottles: t.company_bottles,
            hours: round_to(timestamp::fractional_hours(t.millis), 2),
            average_pressure: if t.pressure_count > 0 {
                round_to(t.pressure_sum / t.pressure_count as f64, 1)
            } else {
                0.0
            },
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
