//! Configuration Types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default discovery-service (Consul) address
pub const DEFAULT_CONSUL: &str = "http://localhost:8500";
/// Default service tag used to filter backends
pub const DEFAULT_SERVICE_TAG: &str = "http-backend";
pub const DEFAULT_VCL_DIR: &str = "vcl";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable names
pub const ENV_CONSUL: &str = "CONSUL";
pub const ENV_SERVICE_TAG: &str = "SERVICE_TAG";
pub const ENV_VCL_DIR: &str = "VCL_DIR";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Agent settings, built once at startup and read-only afterwards
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Discovery service base URL
    pub consul: String,
    /// Tag that selects backend services
    pub service_tag: String,
    pub vcl: VclConfig,
    pub log: LogConfig,
}

/// Generated VCL output configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct VclConfig {
    pub dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Settings {
    /// Look up a setting by key path.
    ///
    /// Known keys are `consul`, `serviceTag`, `vcl.dir` and `log.level`.
    /// Anything else yields `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "consul" => Some(self.consul.as_str()),
            "serviceTag" => Some(self.service_tag.as_str()),
            "vcl.dir" => self.vcl.dir.to_str(),
            "log.level" => Some(self.log.level.as_str()),
            _ => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            consul: DEFAULT_CONSUL.to_string(),
            service_tag: DEFAULT_SERVICE_TAG.to_string(),
            vcl: VclConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for VclConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_VCL_DIR),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_keys() {
        let settings = Settings::default();
        assert_eq!(settings.get("consul"), Some("http://localhost:8500"));
        assert_eq!(settings.get("serviceTag"), Some("http-backend"));
        assert_eq!(settings.get("vcl.dir"), Some("vcl"));
        assert_eq!(settings.get("log.level"), Some("info"));
    }

    #[test]
    fn test_get_unknown_keys() {
        let settings = Settings::default();
        for key in ["", "missing", "consul.url", "service_tag", "vcl", "log.level.x", "CONSUL"] {
            assert_eq!(settings.get(key), None, "key {:?} should be absent", key);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("service_tag = \"api\"").unwrap();
        assert_eq!(settings.service_tag, "api");
        assert_eq!(settings.consul, DEFAULT_CONSUL);
        assert_eq!(settings.vcl.dir, PathBuf::from(DEFAULT_VCL_DIR));
    }
}
