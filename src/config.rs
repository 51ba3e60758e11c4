//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::types::{ReconError, ReconResult};

pub const ENV_DEFAULT_TOLERANCE: &str = "RECONCILIATION_DEFAULT_TOLERANCE_CENTS";
pub const ENV_MAX_TOLERANCE: &str = "RECONCILIATION_MAX_TOLERANCE_CENTS";
pub const ENV_NOT_FOUND_LIMIT: &str = "RECONCILIATION_NOT_FOUND_LIMIT";

/// Tunable policy for a reconciliation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tolerance used when the caller does not pass one (0 = exact only)
    pub default_tolerance_cents: u64,
    /// Largest tolerance a caller may request
    pub max_tolerance_cents: u64,
    /// Keep at most this many not-found records, dropping the oldest
    pub not_found_history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_tolerance_cents: 0,
            max_tolerance_cents: 1_000,
            not_found_history_limit: None,
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> ReconResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (environment, settings file, tests)
    pub fn from_lookup<F>(lookup: F) -> ReconResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            default_tolerance_cents: parse_var(&lookup, ENV_DEFAULT_TOLERANCE)?
                .unwrap_or(defaults.default_tolerance_cents),
            max_tolerance_cents: parse_var(&lookup, ENV_MAX_TOLERANCE)?
                .unwrap_or(defaults.max_tolerance_cents),
            not_found_history_limit: parse_var(&lookup, ENV_NOT_FOUND_LIMIT)?
                .or(defaults.not_found_history_limit),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReconResult<()> {
        if self.default_tolerance_cents > self.max_tolerance_cents {
            return Err(ReconError::Config(format!(
                "default tolerance {} exceeds maximum {}",
                self.default_tolerance_cents, self.max_tolerance_cents
            )));
        }
        if self.not_found_history_limit == Some(0) {
            return Err(ReconError::Config(
                "not-found history limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a caller-supplied tolerance against this policy
    pub fn resolve_tolerance(&self, requested: Option<u64>) -> ReconResult<u64> {
        let tolerance = requested.unwrap_or(self.default_tolerance_cents);
        if tolerance > self.max_tolerance_cents {
            return Err(ReconError::Validation(format!(
                "tolerance of {} cents exceeds the allowed {}",
                tolerance, self.max_tolerance_cents
            )));
        }
        Ok(tolerance)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ReconResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ReconError::Config(format!("invalid value for {}: '{}'", key, raw))),
    }
}
