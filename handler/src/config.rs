use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;

/// Runtime settings read from the Lambda environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Overrides the S3 endpoint, e.g. for LocalStack or MinIO
    pub endpoint: Option<String>,
    pub force_path_style: bool,
    pub callback_timeout: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            force_path_style: false,
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("AWS_ENDPOINT").filter(|e| !e.is_empty());

        let force_path_style = match lookup("AWS_FORCE_PATH_STYLE") {
            Some(value) => value
                .to_ascii_lowercase()
                .parse::<bool>()
                .with_context(|| format!("AWS_FORCE_PATH_STYLE must be true or false, got {value:?}"))?,
            None => false,
        };

        let timeout_secs = match lookup("CALLBACK_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("CALLBACK_TIMEOUT_SECS must be an integer, got {value:?}"))?,
            None => DEFAULT_CALLBACK_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("CALLBACK_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            endpoint,
            force_path_style,
            callback_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HandlerConfig::default());
        assert_eq!(config.callback_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("AWS_ENDPOINT", "http://localhost:4566"),
            ("AWS_FORCE_PATH_STYLE", "TRUE"),
            ("CALLBACK_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        assert!(config.force_path_style);
        assert_eq!(config.callback_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_endpoint_is_ignored() {
        let config = HandlerConfig::from_lookup(lookup(&[("AWS_ENDPOINT", "")])).unwrap();
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(HandlerConfig::from_lookup(lookup(&[("AWS_FORCE_PATH_STYLE", "yes")])).is_err());
        assert!(HandlerConfig::from_lookup(lookup(&[("CALLBACK_TIMEOUT_SECS", "soon")])).is_err());
        assert!(HandlerConfig::from_lookup(lookup(&[("CALLBACK_TIMEOUT_SECS", "0")])).is_err());
    }
}
