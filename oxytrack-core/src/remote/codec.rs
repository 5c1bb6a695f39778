//! Conversion between local entities and remote documents.
//!
//! Locally, dates are ISO strings. The remote stores them as native
//! timestamp values `{"seconds": i64, "nanoseconds": u32}`. The document id
//! is the key and is not repeated inside the document.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::RemoteError;
use crate::protocol::RemoteDocument;
use crate::timestamp;

const SECONDS: &str = "seconds";
const NANOSECONDS: &str = "nanoseconds";

/// Serializes a value into remote document fields.
pub fn encode_fields<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>, RemoteError> {
    match serde_json::to_value(value).map_err(|e| RemoteError::Codec(e.to_string()))? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, to_remote(value)))
            .collect()),
        other => Err(RemoteError::Codec(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Serializes an entity with an `id` field into a keyed remote document.
pub fn encode_entity<T: Serialize + ?Sized>(entity: &T) -> Result<RemoteDocument, RemoteError> {
    let mut data = encode_fields(entity)?;
    match data.remove("id") {
        Some(Value::String(id)) => Ok(RemoteDocument { id, data }),
        _ => Err(RemoteError::Codec("document has no string id".to_string())),
    }
}

/// Deserializes remote document fields.
pub fn decode_fields<T: DeserializeOwned>(data: Map<String, Value>) -> Result<T, RemoteError> {
    let map: Map<String, Value> = data
        .into_iter()
        .map(|(key, value)| (key, from_remote(value)))
        .collect();
    serde_json::from_value(Value::Object(map)).map_err(|e| RemoteError::Codec(e.to_string()))
}

/// Deserializes a keyed remote document, restoring its `id` field.
pub fn decode_entity<T: DeserializeOwned>(document: RemoteDocument) -> Result<T, RemoteError> {
    let RemoteDocument { id, mut data } = document;
    data.insert("id".to_string(), Value::String(id));
    decode_fields(data)
}

fn to_remote(value: Value) -> Value {
    match value {
        Value::String(s) => match timestamp::parse_iso(&s) {
            Some(dt) => {
                let mut ts = Map::new();
                ts.insert(SECONDS.to_string(), Value::from(dt.timestamp()));
                ts.insert(
                    NANOSECONDS.to_string(),
                    Value::from(dt.timestamp_subsec_nanos()),
                );
                Value::Object(ts)
            }
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(to_remote).collect()),
        other => other,
    }
}

fn from_remote(value: Value) -> Value {
    match value {
        Value::Object(map) => match as_timestamp(&map) {
            Some(iso) => Value::String(iso),
            None => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, from_remote(value)))
                    .collect(),
            ),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(from_remote).collect()),
        other => other,
    }
}

fn as_timestamp(map: &Map<String, Value>) -> Option<String> {
    if map.len() != 2 {
        return None;
    }
    let seconds = map.get(SECONDS)?.as_i64()?;
    let nanos = u32::try_from(map.get(NANOSECONDS)?.as_u64()?).ok()?;
    DateTime::from_timestamp(seconds, nanos).map(|dt| timestamp::to_iso(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppSettings, ClientType, ProductionEntry, SaleEntry};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_encode_converts_dates_to_timestamps() {
        let date = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let sale = SaleEntry::new(date, ClientType::Company, "Mining", 3);

        let doc = encode_entity(&sale).unwrap();
        assert_eq!(doc.id, sale.id);
        assert!(!doc.data.contains_key("id"));
        assert_eq!(
            doc.data["saleDate"],
            json!({"seconds": date.timestamp(), "nanoseconds": 0})
        );
        assert_eq!(doc.data["clientName"], "Mining");
    }

    #[test]
    fn test_decode_restores_entity() {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let mut entry = ProductionEntry::start(start, start, "snel", "A");
        entry.set_end_time(Some(Utc.with_ymd_and_hms(2025, 6, 2, 16, 30, 0).unwrap()));

        let doc = encode_entity(&entry).unwrap();
        let decoded: ProductionEntry = decode_entity(doc).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_null_dates_stay_null() {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let entry = ProductionEntry::start(start, start, "snel", "A");

        let doc = encode_entity(&entry).unwrap();
        assert_eq!(doc.data["endTime"], Value::Null);
    }

    #[test]
    fn test_decode_keeps_millis() {
        let mut data = Map::new();
        data.insert(
            "saleDate".to_string(),
            json!({"seconds": 1_748_851_200i64, "nanoseconds": 250_000_000u32}),
        );
        data.insert("clientType".to_string(), json!("hopital"));
        data.insert("clientName".to_string(), json!("HGR"));
        data.insert("recipientName".to_string(), json!("Dr. Mbala"));
        data.insert("ourBottlesCount".to_string(), json!(4));
        data.insert("status".to_string(), json!("pending"));

        let sale: SaleEntry = decode_entity(RemoteDocument {
            id: "s1".to_string(),
            data,
        })
        .unwrap();
        assert_eq!(sale.id, "s1");
        assert_eq!(timestamp::to_iso(&sale.sale_date), "2025-06-02T08:00:00.250Z");
    }

    #[test]
    fn test_encode_fields_rejects_non_object() {
        assert!(matches!(encode_fields(&42), Err(RemoteError::Codec(_))));
    }

    #[test]
    fn test_entity_without_id_is_rejected() {
        assert!(matches!(
            encode_entity(&AppSettings::default()),
            Err(RemoteError::Codec(_))
        ));
    }

    #[test]
    fn test_plain_objects_are_not_timestamps() {
        let value = from_remote(json!({"seconds": 1, "label": "x"}));
        assert_eq!(value, json!({"seconds": 1, "label": "x"}));
    }
}
