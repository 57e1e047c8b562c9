//! Settings loading from JSON or environment variables.
//!
//! Environment variables:
//! - `DYNOBATCH_GET_CHUNK`, `DYNOBATCH_PUT_CHUNK`, `DYNOBATCH_DELETE_CHUNK`
//! - `DYNOBATCH_RETRIES`, `DYNOBATCH_INITIAL_DELAY_MS`, `DYNOBATCH_BACKOFF`
//! - `DYNOBATCH_ENDPOINT_URL`

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::batch_operations::ChunkConfig;
use crate::dynamo::DynamoConfig;
use crate::errors::StoreError;
use crate::retry::{RetryOptions, DEFAULT_BACKOFF, DEFAULT_INITIAL_DELAY, DEFAULT_RETRIES};

/// Serializable form of [`RetryOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retries: u32,
    pub initial_delay_ms: u64,
    pub backoff: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl From<RetrySettings> for RetryOptions {
    fn from(settings: RetrySettings) -> Self {
        RetryOptions {
            retries: settings.retries,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            backoff: settings.backoff,
            rng: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunks: ChunkConfig,
    pub retry: RetrySettings,
    pub dynamo: DynamoConfig,
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| StoreError::Validation(format!("invalid settings: {}", e)))?;
        settings.chunks.validate()?;
        Ok(settings)
    }

    /// Read settings from `DYNOBATCH_*` environment variables.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = parse_var(&lookup, "DYNOBATCH_GET_CHUNK")? {
            settings.chunks.get = v;
        }
        if let Some(v) = parse_var(&lookup, "DYNOBATCH_PUT_CHUNK")? {
            settings.chunks.put = v;
        }
        if let Some(v) = parse_var(&lookup, "DYNOBATCH_DELETE_CHUNK")? {
            settings.chunks.delete = v;
        }
        if let Some(v) = parse_var(&lookup, "DYNOBATCH_RETRIES")? {
            settings.retry.retries = v;
        }
        if let Some(v) = parse_var(&lookup, "DYNOBATCH_INITIAL_DELAY_MS")? {
            settings.retry.initial_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "DYNOBATCH_BACKOFF")? {
            settings.retry.backoff = v;
        }
        settings.dynamo.endpoint_url = lookup("DYNOBATCH_ENDPOINT_URL");

        settings.chunks.validate()?;
        Ok(settings)
    }

    pub fn retry_options(&self) -> RetryOptions {
        self.retry.into()
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, StoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| StoreError::Validation(format!("{}={:?}: {}", name, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.chunks, ChunkConfig::default());
        assert_eq!(settings.retry, RetrySettings::default());
        assert!(settings.dynamo.endpoint_url.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DYNOBATCH_PUT_CHUNK", "25"),
            ("DYNOBATCH_RETRIES", "0"),
            ("DYNOBATCH_BACKOFF", "1.5"),
            ("DYNOBATCH_ENDPOINT_URL", "http://localhost:8000"),
        ]))
        .unwrap();
        assert_eq!(settings.chunks.put, 25);
        assert_eq!(settings.chunks.get, 1000);
        let opts = settings.retry_options();
        assert_eq!(opts.retries, 0);
        assert_eq!(opts.backoff, 1.5);
        assert_eq!(opts.initial_delay, Duration::from_millis(100));
        assert_eq!(
            settings.dynamo.endpoint_url.as_deref(),
            Some("http://localhost:8000")
        );
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = Settings::from_lookup(lookup_from(&[("DYNOBATCH_GET_CHUNK", "lots")])).unwrap_err();
        assert!(matches!(err, StoreError::Validation(m) if m.contains("DYNOBATCH_GET_CHUNK")));
    }

    #[test]
    fn test_env_rejects_zero_chunk() {
        let err = Settings::from_lookup(lookup_from(&[("DYNOBATCH_DELETE_CHUNK", "0")])).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidChunkSize {
                operation: "delete"
            }
        ));
    }

    #[test]
    fn test_from_json() {
        let settings = Settings::from_json(
            r#"{"chunks": {"get": 100, "put": 25, "delete": 25}, "retry": {"retries": 2}}"#,
        )
        .unwrap();
        assert_eq!(settings.chunks, ChunkConfig::dynamodb());
        assert_eq!(settings.retry.retries, 2);
        assert_eq!(settings.retry.initial_delay_ms, 100);
    }
}
