use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const CONNECTION_STRING_VAR: &str = "AzureStorageConnectionString";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Table,
    Memory,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub storage_connection_string: Option<String>,
    pub store_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("store", &self.store)
            .field(
                "storage_connection_string",
                &self.storage_connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "FEEDBACK_API_BIND_ADDR", "127.0.0.1:7071");

        let store = match value_or_default(&lookup, "FEEDBACK_STORE", "table")
            .to_ascii_lowercase()
            .as_str()
        {
            "table" => StoreBackend::Table,
            "memory" => StoreBackend::Memory,
            _ => {
                return Err(ConfigError::Invalid(
                    "FEEDBACK_STORE must be `table` or `memory`".to_string(),
                ))
            }
        };

        let storage_connection_string = match store {
            StoreBackend::Table => Some(required_trimmed(&lookup, CONNECTION_STRING_VAR)?),
            StoreBackend::Memory => optional_trimmed(&lookup, CONNECTION_STRING_VAR),
        };

        let store_timeout_secs = value_or_default(&lookup, "FEEDBACK_STORE_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "FEEDBACK_STORE_TIMEOUT_SECS must be an integer in [1, 300]".to_string(),
                )
            })?;
        if !(1..=300).contains(&store_timeout_secs) {
            return Err(ConfigError::Invalid(
                "FEEDBACK_STORE_TIMEOUT_SECS must be in [1, 300]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            store,
            storage_connection_string,
            store_timeout: Duration::from_secs(store_timeout_secs),
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_requires_connection_string() {
        let map: HashMap<&str, &str> = HashMap::new();
        let err = config_from(&map).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(CONNECTION_STRING_VAR)));
        assert!(err.to_string().contains("AzureStorageConnectionString"));
    }

    #[test]
    fn blank_connection_string_counts_as_missing() {
        let map = HashMap::from([(CONNECTION_STRING_VAR, "   ")]);
        assert!(matches!(
            config_from(&map).unwrap_err(),
            ConfigError::MissingVar(_)
        ));
    }

    #[test]
    fn config_applies_defaults() {
        let map = HashMap::from([(CONNECTION_STRING_VAR, "UseDevelopmentStorage=true")]);
        let config = config_from(&map).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7071");
        assert_eq!(config.store, StoreBackend::Table);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert_eq!(
            config.storage_connection_string.as_deref(),
            Some("UseDevelopmentStorage=true")
        );
    }

    #[test]
    fn memory_store_needs_no_connection_string() {
        let map = HashMap::from([
            ("FEEDBACK_STORE", "Memory"),
            ("FEEDBACK_API_BIND_ADDR", "0.0.0.0:8080"),
        ]);
        let config = config_from(&map).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.storage_connection_string, None);
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        for (name, value) in [
            ("FEEDBACK_STORE_TIMEOUT_SECS", "0"),
            ("FEEDBACK_STORE_TIMEOUT_SECS", "soon"),
            ("FEEDBACK_STORE", "sqlite"),
        ] {
            let map = HashMap::from([
                (CONNECTION_STRING_VAR, "UseDevelopmentStorage=true"),
                (name, value),
            ]);
            assert!(
                matches!(config_from(&map).unwrap_err(), ConfigError::Invalid(_)),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn config_redacts_connection_string() {
        let map = HashMap::from([(
            CONNECTION_STRING_VAR,
            "AccountName=acct;AccountKey=c2Vuc2l0aXZlLWtleQ==",
        )]);
        let config = config_from(&map).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("c2Vuc2l0aXZlLWtleQ=="));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
