use crate::constants::*;
use crate::error::{ExporterError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Runtime settings, read once at startup and passed down by reference.
#[derive(Clone)]
pub struct Config {
    pub server_url: String,
    pub token: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load from the process environment, after applying a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Missing server URL or token are only
    /// warned about: every upstream request then fails and degrades.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup(SERVER_ENV).unwrap_or_else(|| {
            warn!("{} is not set; upstream requests will fail", SERVER_ENV);
            String::new()
        });
        let token = lookup(TOKEN_ENV).unwrap_or_else(|| {
            warn!("{} is not set; requests will be sent with an empty token", TOKEN_ENV);
            String::new()
        });

        let port = parse_var(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let poll_secs = parse_var(&lookup, POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL_SECS)?;
        let timeout_secs = parse_var(&lookup, REQUEST_TIMEOUT_ENV, DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            token,
            port,
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            ExporterError::Config(format!("Invalid value '{}' for {}: {}", raw, name, e))
        }),
        None => Ok(default),
    }
}

// Keeps the token out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("port", &self.port)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_apply_when_optional_vars_missing() {
        let config = Config::from_lookup(lookup_from(&[
            (SERVER_ENV, "https://sonar.example.com/"),
            (TOKEN_ENV, "squ_abc"),
        ]))
        .unwrap();

        assert_eq!(config.server_url, "https://sonar.example.com");
        assert_eq!(config.token, "squ_abc");
        assert_eq!(config.port, 8198);
        assert_eq!(config.poll_interval, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            (SERVER_ENV, "http://localhost:9000"),
            (TOKEN_ENV, "t"),
            (PORT_ENV, "9100"),
            (POLL_INTERVAL_ENV, " 60 "),
            (REQUEST_TIMEOUT_ENV, "5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_server_is_not_fatal() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.server_url.is_empty());
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[(PORT_ENV, "eighty")])).unwrap_err();
        assert!(matches!(err, ExporterError::Config(_)));
        assert!(err.to_string().contains(PORT_ENV));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_lookup(lookup_from(&[(TOKEN_ENV, "squ_secret")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("squ_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
