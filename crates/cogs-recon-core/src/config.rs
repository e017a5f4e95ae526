use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::ReconResult;

pub const BASE_URL_ENV: &str = "AC_BASE_URL";
pub const API_KEY_ENV: &str = "AC_API_KEY";
pub const TIMEOUT_ENV: &str = "AC_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the statements API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve settings from the process environment.
    pub fn from_env(base_url: Option<&str>, api_key: Option<&str>) -> ReconResult<Self> {
        Self::resolve(base_url, api_key, |name| std::env::var(name).ok())
    }

    /// Explicit argument, then `lookup(<ENV>)`, then the built-in default.
    /// Blank values count as unset.
    pub fn resolve<F>(base_url: Option<&str>, api_key: Option<&str>, lookup: F) -> ReconResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: String| if v.trim().is_empty() { None } else { Some(v) };

        let base_url = base_url
            .map(str::to_string)
            .and_then(non_blank)
            .or_else(|| lookup(BASE_URL_ENV).and_then(non_blank))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = api_key
            .map(str::to_string)
            .and_then(non_blank)
            .or_else(|| lookup(API_KEY_ENV).and_then(non_blank));

        let timeout_secs = match lookup(TIMEOUT_ENV).and_then(non_blank) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ReconError::Configuration(format!(
                    "{TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: trim_base_url(&base_url),
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::resolve(None, None, env(&[])).unwrap();
        assert_eq!(cfg.base_url, "http://localhost:3000");
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_fallback() {
        let cfg = ClientConfig::resolve(
            None,
            None,
            env(&[
                (BASE_URL_ENV, "https://api.example.com/"),
                (API_KEY_ENV, "secret"),
                (TIMEOUT_ENV, "30"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.example.com");
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_wins() {
        let cfg = ClientConfig::resolve(
            Some("http://override:9000"),
            Some("k"),
            env(&[(BASE_URL_ENV, "https://api.example.com"), (API_KEY_ENV, "secret")]),
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://override:9000");
        assert_eq!(cfg.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_blank_values_ignored() {
        let cfg = ClientConfig::resolve(Some("  "), None, env(&[(API_KEY_ENV, "")])).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.api_key, None);
    }

    #[test]
    fn test_bad_timeout() {
        let err = ClientConfig::resolve(None, None, env(&[(TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, ReconError::Configuration(_)));
    }
}
