//! # Configuration
//!
//! [`DirectoryConfig`] says where the User collection lives and how the in-process backend
//! behaves. Values come from the environment, falling back to defaults:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `RESOURCE_BASE_URL` | `base_url` | `""` |
//! | `RESOURCE_PATH` | `resource_path` | `/api/users/:id` |
//! | `RESOURCE_LATENCY_MS` | `latency_ms` | `0` |

use resource_service::ResourcePath;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a whole number of milliseconds, got {value:?}")]
    InvalidLatency { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub resource_path: String,
    /// Simulated backend latency applied to every response.
    pub latency_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            resource_path: "/api/users/:id".to_string(),
            latency_ms: 0,
        }
    }
}

impl DirectoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup("RESOURCE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(path) = lookup("RESOURCE_PATH") {
            config.resource_path = path;
        }
        if let Some(value) = lookup("RESOURCE_LATENCY_MS") {
            config.latency_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidLatency {
                        name: "RESOURCE_LATENCY_MS",
                        value,
                    })?;
        }
        Ok(config)
    }

    pub fn resource_path(&self) -> ResourcePath {
        ResourcePath::new(&self.resource_path).with_base(&self.base_url)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = DirectoryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DirectoryConfig::default());
        assert_eq!(config.resource_path().collection_url(), "/api/users");
    }

    #[test]
    fn reads_overrides() {
        let config = DirectoryConfig::from_lookup(lookup(&[
            ("RESOURCE_BASE_URL", "http://localhost:9000"),
            ("RESOURCE_PATH", "/v2/people/:id"),
            ("RESOURCE_LATENCY_MS", "25"),
        ]))
        .unwrap();

        assert_eq!(
            config.resource_path().member_url("4"),
            "http://localhost:9000/v2/people/4"
        );
        assert_eq!(config.latency(), Duration::from_millis(25));
    }

    #[test]
    fn rejects_bad_latency() {
        let err = DirectoryConfig::from_lookup(lookup(&[("RESOURCE_LATENCY_MS", "fast")]));
        assert!(matches!(err, Err(ConfigError::InvalidLatency { .. })));
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: DirectoryConfig =
            serde_json::from_str(r#"{"latency_ms": 5}"#).unwrap();
        assert_eq!(config.latency_ms, 5);
        assert_eq!(config.resource_path, "/api/users/:id");
    }
}
