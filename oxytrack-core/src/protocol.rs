//! Shapes exchanged with the document server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Document id of the settings singleton.
pub const SETTINGS_DOC_ID: &str = "global";

/// Remote collections, one per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Productions,
    Sales,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Productions,
        Collection::Sales,
        Collection::Settings,
    ];

    /// Name used in URLs and on disk.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Productions => "productions",
            Collection::Sales => "sales",
            Collection::Settings => "settings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "productions" => Some(Collection::Productions),
            "sales" => Some(Collection::Sales),
            "settings" => Some(Collection::Settings),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document: its key plus the field map, without the id inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

/// Full contents of a collection, pushed to subscribers on connect and after
/// every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub collection: Collection,
    pub documents: Vec<RemoteDocument>,
}
