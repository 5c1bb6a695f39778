use serde::{Deserialize, Serialize};

pub const DEFAULT_PRODUCER: &str = "Rodrigue Gasore";
pub const DEFAULT_COMPANY_NAME: &str = "OxyTrack";

/// Application-wide settings, shared by every device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Producer pre-filled when a run is started.
    pub default_producer: String,
    /// Name printed on reports.
    pub company_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_producer: DEFAULT_PRODUCER.to_string(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
        }
    }
}

impl AppSettings {
    /// Applies every field present in `patch`.
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(producer) = &patch.default_producer {
            self.default_producer = producer.clone();
        }
        if let Some(company) = &patch.company_name {
            self.company_name = company.clone();
        }
    }
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.default_producer.is_none() && self.company_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_producer, "Rodrigue Gasore");
        assert_eq!(settings.company_name, "OxyTrack");
    }

    #[test]
    fn test_merge_only_present_fields() {
        let mut settings = AppSettings::default();
        settings.merge(&SettingsPatch {
            default_producer: Some("Jean".to_string()),
            company_name: None,
        });
        assert_eq!(settings.default_producer, "Jean");
        assert_eq!(settings.company_name, "OxyTrack");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"defaultProducer":"Jean"}"#).unwrap();
        assert_eq!(settings.default_producer, "Jean");
        assert_eq!(settings.company_name, "OxyTrack");
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = SettingsPatch {
            company_name: Some("Oxy Sud".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"companyName":"Oxy Sud"}"#
        );
        assert!(!patch.is_empty());
        assert!(SettingsPatch::default().is_empty());
    }
}
