//! Environment-driven configuration.

use crate::error::{ExplainError, Result};
use crate::scorer::ExecutionMode;
use std::time::Duration;

pub const DEFAULT_SCORER_URL: &str = "http://localhost:2023";
pub const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainerConfig {
    pub scorer_url: String,
    pub scorer_timeout: Duration,
    pub execution_mode: ExecutionMode,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            scorer_url: DEFAULT_SCORER_URL.to_string(),
            scorer_timeout: Duration::from_secs(DEFAULT_SCORER_TIMEOUT_SECS),
            execution_mode: ExecutionMode::Worker,
        }
    }
}

impl ExplainerConfig {
    /// Read settings from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scorer_url = lookup("EXPLAINER_SCORER_URL").unwrap_or(defaults.scorer_url);

        let scorer_timeout = match lookup("EXPLAINER_SCORER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                ExplainError::Config(format!("EXPLAINER_SCORER_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            None => defaults.scorer_timeout,
        };

        let execution_mode = match lookup("EXPLAINER_EXECUTION_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.execution_mode,
        };

        Ok(Self {
            scorer_url,
            scorer_timeout,
            execution_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExplainerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ExplainerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ExplainerConfig::from_lookup(lookup(&[
            ("EXPLAINER_SCORER_URL", "http://scorer:9000"),
            ("EXPLAINER_SCORER_TIMEOUT_SECS", "5"),
            ("EXPLAINER_EXECUTION_MODE", "server"),
        ]))
        .unwrap();
        assert_eq!(config.scorer_url, "http://scorer:9000");
        assert_eq!(config.scorer_timeout, Duration::from_secs(5));
        assert_eq!(config.execution_mode, ExecutionMode::Server);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ExplainerConfig::from_lookup(lookup(&[("EXPLAINER_SCORER_TIMEOUT_SECS", "soon")])).is_err());
        assert!(ExplainerConfig::from_lookup(lookup(&[("EXPLAINER_EXECUTION_MODE", "gpu")])).is_err());
    }
}
