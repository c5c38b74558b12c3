//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Keywords that start the form when sent by a session with no form running.
pub const DEFAULT_TRIGGER_KEYWORDS: &[&str] = &["form", "register", "sign up", "info", "information"];

/// Intake flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Sessions untouched for this long are evicted by the sweep task.
    pub session_idle_timeout: Duration,
    /// How often the eviction sweep runs.
    pub sweep_interval: Duration,
    /// Lower-case keywords that start the form from an idle session.
    pub trigger_keywords: Vec<String>,
    /// Port for the flow status routes.
    pub http_port: u16,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            sweep_interval: Duration::from_secs(60),
            trigger_keywords: DEFAULT_TRIGGER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            http_port: 8080,
        }
    }
}

impl FlowConfig {
    /// Build a config from `FLOW_*` environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FlowConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64>(&lookup, "FLOW_SESSION_IDLE_SECS")? {
            config.session_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FLOW_SWEEP_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "FLOW_SWEEP_INTERVAL_SECS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(port) = parse_var::<u16>(&lookup, "FLOW_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(raw) = lookup("FLOW_TRIGGER_KEYWORDS") {
            let keywords: Vec<String> = raw
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "FLOW_TRIGGER_KEYWORDS".to_string(),
                    message: "no keywords given".to_string(),
                });
            }
            config.trigger_keywords = keywords;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}
