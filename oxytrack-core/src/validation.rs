//! Form-boundary checks. Nothing that fails here ever reaches the store.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{BottleDestination, ClientType};

/// Energy sources offered by the production form. Anything else goes
/// through [`SOURCE_OTHER`] with a free-text value.
pub const KNOWN_SOURCES: [&str; 3] = ["groupe", "snel", "socodee"];

/// Marker for a free-text energy source.
pub const SOURCE_OTHER: &str = "autre";

/// Observation text stored when the operator has nothing to report.
pub const DEFAULT_OBSERVATIONS: &str = "RAS";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Unknown energy source '{0}'. Valid options: groupe, snel, socodee, autre")]
    UnknownSource(String),

    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Recipient name is required for hospital sales")]
    MissingRecipient,

    #[error("Client name '{0}' is already used")]
    DuplicateClient(String),

    #[error("Secondary client name is required when bottles go to a company")]
    MissingSecondaryClient,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Resolves the energy source selected on the form to the stored value.
///
/// `autre` requires a non-empty free-text value, which becomes the source.
pub fn resolve_source(selected: &str, other: Option<&str>) -> ValidationResult<String> {
    let selected = selected.trim().to_lowercase();
    if selected.is_empty() {
        return Err(ValidationError::Required("Source"));
    }
    if KNOWN_SOURCES.contains(&selected.as_str()) {
        return Ok(selected);
    }
    if selected == SOURCE_OTHER {
        return match other.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ValidationError::Required("Other source")),
        };
    }
    Err(ValidationError::UnknownSource(selected))
}

pub fn validate_producer(producer: &str) -> ValidationResult<String> {
    non_empty(producer, "Producer")
}

pub fn validate_time_order(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

/// Hospital sales must name the person who received the bottles.
pub fn validate_recipient(client_type: ClientType, recipient: &str) -> ValidationResult<()> {
    if client_type == ClientType::Hospital && recipient.trim().is_empty() {
        return Err(ValidationError::MissingRecipient);
    }
    Ok(())
}

pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    non_empty(name, "Client name")
}

/// Empty observations are stored as `RAS`.
pub fn normalize_observations(observations: &str) -> String {
    let trimmed = observations.trim();
    if trimmed.is_empty() {
        DEFAULT_OBSERVATIONS.to_string()
    } else {
        trimmed.to_string()
    }
}

/// When a run is split with a company, a positive count needs a name.
///
/// Returns the cleaned name and count, or `(None, None)` when the whole run
/// went to the hospital.
pub fn validate_secondary_client(
    destination: BottleDestination,
    name: Option<&str>,
    count: Option<u32>,
) -> ValidationResult<(Option<String>, Option<u32>)> {
    if !destination.includes_secondary_client() {
        return Ok((None, None));
    }
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    match (name, count) {
        (Some(name), count) => Ok((Some(name.to_string()), count)),
        (None, Some(count)) if count > 0 => Err(ValidationError::MissingSecondaryClient),
        (None, count) => Ok((None, count)),
    }
}

fn non_empty(value: &str, field: &'static str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_known_source() {
        assert_eq!(resolve_source("SNEL", None).unwrap(), "snel");
        assert_eq!(resolve_source("groupe", Some("ignored")).unwrap(), "groupe");
    }

    #[test]
    fn test_resolve_other_source() {
        assert_eq!(resolve_source("autre", Some(" Solaire ")).unwrap(), "Solaire");
        assert_eq!(
            resolve_source("autre", Some("  ")),
            Err(ValidationError::Required("Other source"))
        );
        assert_eq!(
            resolve_source("autre", None),
            Err(ValidationError::Required("Other source"))
        );
    }

    #[test]
    fn test_resolve_unknown_source() {
        assert!(matches!(
            resolve_source("wind", None),
            Err(ValidationError::UnknownSource(_))
        ));
        assert_eq!(resolve_source("", None), Err(ValidationError::Required("Source")));
    }

    #[test]
    fn test_time_order() {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 2, 16, 30, 0).unwrap();
        assert!(validate_time_order(start, end).is_ok());
        assert_eq!(validate_time_order(end, start), Err(ValidationError::EndBeforeStart));
        assert_eq!(validate_time_order(start, start), Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn test_hospital_sale_needs_recipient() {
        assert_eq!(
            validate_recipient(ClientType::Hospital, " "),
            Err(ValidationError::MissingRecipient)
        );
        assert!(validate_recipient(ClientType::Hospital, "Dr. Mbala").is_ok());
        assert!(validate_recipient(ClientType::Company, "").is_ok());
    }

    #[test]
    fn test_observations_default() {
        assert_eq!(normalize_observations(""), "RAS");
        assert_eq!(normalize_observations("  fuite vanne "), "fuite vanne");
    }

    #[test]
    fn test_secondary_client() {
        assert_eq!(
            validate_secondary_client(BottleDestination::Hospital, Some("X"), Some(5)).unwrap(),
            (None, None)
        );
        assert_eq!(
            validate_secondary_client(BottleDestination::HospitalAndCompanies, Some("Mining"), Some(5))
                .unwrap(),
            (Some("Mining".to_string()), Some(5))
        );
        assert_eq!(
            validate_secondary_client(BottleDestination::HospitalAndCompanies, None, Some(5)),
            Err(ValidationError::MissingSecondaryClient)
        );
        assert_eq!(
            validate_secondary_client(BottleDestination::HospitalAndCompanies, Some(""), Some(0))
                .unwrap(),
            (None, Some(0))
        );
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(validate_producer("  "), Err(ValidationError::Required("Producer")));
        assert_eq!(validate_client_name(" Mining "), Ok("Mining".to_string()));
    }
}
