//! Router configuration.
//!
//! Every field has a default, so a partial JSON document is a valid
//! configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RouterResult, ValidationError};

/// Default name for dispatch threads spawned by [`ThreadSpawner`](super::ThreadSpawner).
pub const DEFAULT_DISPATCH_THREAD_NAME: &str = "matchcast-dispatch";

/// Settings for [`Router::new`](super::Router::new).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Alias scheme used for every field resolution (for example `"json"`).
    /// `None` resolves declared member names only.
    pub alias_key: Option<String>,
    /// Thread name for the default spawner.
    pub dispatch_thread_name: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            alias_key: None,
            dispatch_thread_name: DEFAULT_DISPATCH_THREAD_NAME.to_string(),
        }
    }
}

impl RouterConfig {
    /// Sets the alias scheme.
    #[must_use]
    pub fn with_alias_key(mut self, alias_key: impl Into<String>) -> Self {
        self.alias_key = Some(alias_key.into());
        self
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> RouterResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        if cfg.dispatch_thread_name.contains('\0') {
            return Err(ValidationError::InvalidConfig {
                reason: "dispatch_thread_name must not contain NUL".to_string(),
            }
            .into());
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RouterConfig::default();
        assert!(cfg.alias_key.is_none());
        assert_eq!(cfg.dispatch_thread_name, DEFAULT_DISPATCH_THREAD_NAME);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let cfg = RouterConfig::from_json_str(r#"{"alias_key": "json"}"#).unwrap();
        assert_eq!(cfg, RouterConfig::default().with_alias_key("json"));

        let cfg = RouterConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, RouterConfig::default());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = RouterConfig::from_json_str(r#"{"alias_key": 3}"#).unwrap_err();
        assert!(err.is_validation());
        assert!(RouterConfig::from_json_str(r#"{"dispatch_thread_name": "a\u0000b"}"#).is_err());
    }
}
