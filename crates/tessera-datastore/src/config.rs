//! Instrumentation filter configuration

use crate::error::DatastoreError;
use serde::{Deserialize, Serialize};

/// Settings for the [`instrument`](crate::instrument::instrument) filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Label attached to every log event
    pub label: String,
    /// Log successful batch calls at debug level
    pub log_successes: bool,
    /// Log each failed element of a partial batch failure
    pub log_element_errors: bool,
    /// Upper bound on per-element events emitted for one call
    pub max_logged_errors: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            label: "datastore".to_string(),
            log_successes: false,
            log_element_errors: true,
            max_logged_errors: 8,
        }
    }
}

impl InstrumentConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, DatastoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DatastoreError::invalid_config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Enable or disable success logging
    pub fn with_log_successes(mut self, enabled: bool) -> Self {
        self.log_successes = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DatastoreError> {
        if self.label.trim().is_empty() {
            return Err(DatastoreError::invalid_config("label cannot be empty"));
        }
        if self.log_element_errors && self.max_logged_errors == 0 {
            return Err(DatastoreError::invalid_config(
                "max_logged_errors must be positive when element logging is enabled",
            ));
        }
        Ok(())
    }
}
