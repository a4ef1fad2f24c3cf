//! Options for lookups and verification.
//!
//! Options can be built in code or read from the provider configuration
//! block the host passes to `configure`:
//!
//! ```
//! use hemmer_provider_lookup::config::VerifierConfig;
//! use hemmer_provider_lookup::types::AbsencePolicy;
//! use serde_json::json;
//!
//! let config = VerifierConfig::from_value(json!({
//!     "timeout_secs": 30,
//!     "concurrency": 4,
//!     "absence": "empty_means_absent"
//! }))
//! .unwrap();
//!
//! assert_eq!(config.concurrency, 4);
//! assert_eq!(config.absence, AbsencePolicy::EmptyMeansAbsent);
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::types::AbsencePolicy;

/// Default deadline for a single remote lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of lookups a verifier keeps in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was present but not acceptable.
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// The configuration block could not be deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Options applied to every lookup a finder performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    /// Deadline for one remote call. `None` waits indefinitely; a
    /// [`LookupContext`](crate::finder::LookupContext) timeout overrides it.
    /// Default: 60 seconds.
    pub timeout: Option<Duration>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_LOOKUP_TIMEOUT),
        }
    }
}

impl LookupOptions {
    /// Create lookup options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the per-call timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Options for a [`Verifier`](crate::verifier::Verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Options passed to the underlying finder.
    pub lookup: LookupOptions,
    /// Maximum number of lookups in flight during a destroy check.
    pub concurrency: usize,
    /// How an empty result is treated when checking absence.
    pub absence: AbsencePolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            lookup: LookupOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
            absence: AbsencePolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVerifierConfig {
    timeout_secs: Option<u64>,
    concurrency: Option<usize>,
    absence: Option<AbsencePolicy>,
}

impl VerifierConfig {
    /// Create a verifier config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the config from a JSON configuration block.
    ///
    /// Missing keys keep their defaults, `null` means "all defaults", and
    /// `timeout_secs: 0` disables the lookup timeout.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw: RawVerifierConfig = serde_json::from_value(value)?;

        let mut config = Self::default();
        if let Some(secs) = raw.timeout_secs {
            config.lookup = if secs == 0 {
                LookupOptions::new().without_timeout()
            } else {
                LookupOptions::new().with_timeout(Duration::from_secs(secs))
            };
        }
        if let Some(concurrency) = raw.concurrency {
            if concurrency == 0 {
                return Err(ConfigError::Invalid(
                    "concurrency must be at least 1".to_string(),
                ));
            }
            config.concurrency = concurrency;
        }
        if let Some(absence) = raw.absence {
            config.absence = absence;
        }
        Ok(config)
    }

    /// Set the lookup options.
    pub fn with_lookup_options(mut self, lookup: LookupOptions) -> Self {
        self.lookup = lookup;
        self
    }

    /// Set the destroy-check concurrency. Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the absence policy.
    pub fn with_absence(mut self, absence: AbsencePolicy) -> Self {
        self.absence = absence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.lookup.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.absence, AbsencePolicy::Strict);
    }

    #[test]
    fn test_from_null_and_empty() {
        assert_eq!(
            VerifierConfig::from_value(serde_json::Value::Null).unwrap(),
            VerifierConfig::default()
        );
        assert_eq!(
            VerifierConfig::from_value(json!({})).unwrap(),
            VerifierConfig::default()
        );
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = VerifierConfig::from_value(json!({"timeout_secs": 0})).unwrap();
        assert_eq!(config.lookup.timeout, None);
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = VerifierConfig::from_value(json!({"concurrency": 0})).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: concurrency must be at least 1"
        );
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_types() {
        let err = VerifierConfig::from_value(json!({"retries": 3})).unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));

        let err = VerifierConfig::from_value(json!({"absence": "lenient"})).unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }

    #[test]
    fn test_builders() {
        let config = VerifierConfig::new()
            .with_concurrency(0)
            .with_absence(AbsencePolicy::EmptyMeansAbsent)
            .with_lookup_options(LookupOptions::new().with_timeout(Duration::from_secs(5)));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.absence, AbsencePolicy::EmptyMeansAbsent);
        assert_eq!(config.lookup.timeout, Some(Duration::from_secs(5)));
    }
}
