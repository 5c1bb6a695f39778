use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::timestamp::{self, iso};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    #[serde(rename = "hopital")]
    Hospital,
    #[serde(rename = "entreprise")]
    Company,
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientType::Hospital => write!(f, "hopital"),
            ClientType::Company => write!(f, "entreprise"),
        }
    }
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hopital" | "hospital" => Ok(ClientType::Hospital),
            "entreprise" | "company" => Ok(ClientType::Company),
            _ => Err(format!(
                "Invalid client type '{}'. Valid options: hopital, entreprise",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
}

impl SaleStatus {
    /// Label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "En attente",
            SaleStatus::Completed => "Récupérée",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Pending => write!(f, "pending"),
            SaleStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "completed" | "recovered" => Ok(SaleStatus::Completed),
            _ => Err(format!(
                "Invalid sale status '{}'. Valid options: pending, completed",
                s
            )),
        }
    }
}

/// A delivery of bottles to a client. Completed once the bottles are back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleEntry {
    pub id: String,
    #[serde(with = "iso")]
    pub sale_date: DateTime<Utc>,
    pub client_type: ClientType,
    pub client_name: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub our_bottles_count: u32,
    #[serde(default)]
    pub client_bottles_count: u32,
    #[serde(default)]
    pub bottle_numbers: String,
    pub status: SaleStatus,
    #[serde(with = "iso", default = "timestamp::epoch")]
    pub updated_at: DateTime<Utc>,
}

impl SaleEntry {
    pub fn new(
        sale_date: DateTime<Utc>,
        client_type: ClientType,
        client_name: impl Into<String>,
        our_bottles_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sale_date,
            client_type,
            client_name: client_name.into(),
            recipient_name: String::new(),
            our_bottles_count,
            client_bottles_count: 0,
            bottle_numbers: String::new(),
            status: SaleStatus::Pending,
            updated_at: timestamp::now(),
        }
    }

    pub fn with_recipient(mut self, recipient_name: impl Into<String>) -> Self {
        self.recipient_name = recipient_name.into();
        self
    }

    pub fn with_client_bottles(mut self, count: u32) -> Self {
        self.client_bottles_count = count;
        self
    }

    pub fn with_bottle_numbers(mut self, numbers: impl Into<String>) -> Self {
        self.bottle_numbers = numbers.into();
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == SaleStatus::Completed
    }

    /// Marks the client's bottles as recovered.
    pub fn mark_recovered(&mut self) {
        self.status = SaleStatus::Completed;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = timestamp::now();
    }
}
