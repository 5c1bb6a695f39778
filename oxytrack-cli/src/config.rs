//! `oxy` configuration.
//!
//! Values are layered: built-in defaults, then `config.yaml`, then the
//! `OXY_*` environment variables. Each value remembers which layer set it
//! so `oxy config show` can explain where it came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const ENV_DATA_DIR: &str = "OXY_DATA_DIR";
const ENV_REMOTE_URL: &str = "OXY_REMOTE_URL";
const ENV_API_KEY: &str = "OXY_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// A setting together with the layer it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local cache files
    pub data_dir: ConfigValue<PathBuf>,
    /// Base URL of the document server
    pub remote_url: ConfigValue<Option<String>>,
    #[serde(skip)]
    pub api_key: ConfigValue<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileLayer {
    data_dir: Option<PathBuf>,
    remote: RemoteSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RemoteSection {
    url: Option<String>,
    api_key: Option<String>,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self {
            data_dir: ConfigValue::default_value(Self::default_data_dir()),
            remote_url: ConfigValue::default_value(None),
            api_key: ConfigValue::default_value(None),
            config_file: None,
        };

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            config.apply_file(&path)?;
        }
        config.apply_env();

        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let layer: FileLayer = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

        if let Some(dir) = layer.data_dir {
            // Relative paths are taken from the config file's directory
            let dir = match path.parent() {
                Some(parent) if dir.is_relative() => parent.join(dir),
                _ => dir,
            };
            self.data_dir.set(dir, ConfigSource::File);
        }
        if let Some(url) = layer.remote.url {
            self.remote_url.set(Some(url), ConfigSource::File);
        }
        if let Some(key) = layer.remote.api_key {
            self.api_key.set(Some(key), ConfigSource::File);
        }

        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Some(dir) = env_override(ENV_DATA_DIR) {
            self.data_dir.set(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(url) = env_override(ENV_REMOTE_URL) {
            self.remote_url.set(Some(url), ConfigSource::Environment);
        }
        if let Some(key) = env_override(ENV_API_KEY) {
            self.api_key.set(Some(key), ConfigSource::Environment);
        }
    }

    /// Server URL and API key, when both are known.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        match (&self.remote_url.value, &self.api_key.value) {
            (Some(url), Some(key)) => Some((url, key)),
            _ => None,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote_credentials().is_some()
    }

    /// `~/.config/oxytrack` on Linux, the platform equivalent elsewhere.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxytrack")
    }

    /// `~/.local/share/oxytrack` on Linux.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxytrack")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, e) => {
                write!(f, "Cannot read config file '{}': {}", path.display(), e)
            }
            ConfigError::Parse(path, e) => {
                write!(f, "Invalid config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_yaml(yaml: &str) -> (Config, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        (Config::load(Some(path)).unwrap(), temp_dir)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load(Some(temp_dir.path().join("absent.yaml"))).unwrap();

        assert!(config.data_dir.value.ends_with("oxytrack"));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
        assert!(!config.has_remote());
    }

    #[test]
    fn test_file_layer() {
        let (config, temp_dir) = load_yaml(
            "data_dir: /srv/oxytrack\nremote:\n  url: http://localhost:8080\n  api_key: secret\n",
        );

        assert_eq!(config.data_dir.value, PathBuf::from("/srv/oxytrack"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.remote_url.source, ConfigSource::File);
        assert_eq!(
            config.config_file,
            Some(temp_dir.path().join("config.yaml"))
        );
        assert_eq!(
            config.remote_credentials(),
            Some(("http://localhost:8080", "secret"))
        );
    }

    #[test]
    fn test_relative_data_dir() {
        let (config, temp_dir) = load_yaml("data_dir: data\n");
        assert_eq!(config.data_dir.value, temp_dir.path().join("data"));
    }

    #[test]
    fn test_url_without_key_is_not_a_remote() {
        let (config, _temp_dir) = load_yaml("remote:\n  url: http://localhost:8080\n");
        assert!(!config.has_remote());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let (config, _temp_dir) = load_yaml("remote:\n  url: http://x\n  api_key: secret\n");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("http://x"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_environment_wins() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "data_dir: /from/file\n").unwrap();

        std::env::set_var(ENV_DATA_DIR, "/from/env");
        let config = Config::load(Some(path)).unwrap();
        std::env::remove_var(ENV_DATA_DIR);

        assert_eq!(config.data_dir.value, PathBuf::from("/from/env"));
        assert_eq!(config.data_dir.source, ConfigSource::Environment);
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "remote: [\n").unwrap();

        let err = Config::load(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
