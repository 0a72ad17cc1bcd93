//! Process configuration, read from `WORKHUB_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use workhub_observability::{LogFormat, UnknownLogFormat};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WORKHUB_BIND_ADDR '{value}' is not a socket address: {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("WORKHUB_LOG_FORMAT: {0}")]
    InvalidLogFormat(#[from] UnknownLogFormat),

    #[error("WORKHUB_REQUEST_TIMEOUT_SECS '{0}' is not a positive whole number of seconds")]
    InvalidRequestTimeout(String),

    #[error("WORKHUB_JWT_SECRET must be set when WORKHUB_ENV is '{0}'")]
    MissingJwtSecret(String),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub log_format: LogFormat,
    pub request_timeout: Duration,
    /// True when no secret was configured and the dev default is in use.
    pub insecure_jwt_secret: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = get("WORKHUB_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let log_format = match get("WORKHUB_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::default(),
        };

        let request_timeout = match get("WORKHUB_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidRequestTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let env = get("WORKHUB_ENV").unwrap_or_else(|| "dev".to_string());
        let (jwt_secret, insecure_jwt_secret) = match get("WORKHUB_JWT_SECRET") {
            Some(secret) => (secret, false),
            None if env == "dev" || env == "test" => (DEV_JWT_SECRET.to_string(), true),
            None => return Err(ConfigError::MissingJwtSecret(env)),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            log_format,
            request_timeout,
            insecure_jwt_secret,
        })
    }

    /// Ephemeral-port config with a fixed secret.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.to_string(),
            log_format: LogFormat::Pretty,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            insecure_jwt_secret: false,
        }
    }

    /// Call once tracing is initialized.
    pub fn warn_if_insecure(&self) {
        if self.insecure_jwt_secret {
            tracing::warn!("WORKHUB_JWT_SECRET not set; using insecure dev default");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_in_dev() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(cfg.insecure_jwt_secret);
    }

    #[test]
    fn secret_is_required_outside_dev() {
        let err = config(&[("WORKHUB_ENV", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingJwtSecret(env) if env == "production"));

        let cfg = config(&[("WORKHUB_ENV", "production"), ("WORKHUB_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(!cfg.insecure_jwt_secret);
    }

    #[test]
    fn malformed_values_are_reported() {
        assert!(matches!(
            config(&[("WORKHUB_BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            config(&[("WORKHUB_LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
        assert_eq!(config(&[("WORKHUB_LOG_FORMAT", "pretty")]).unwrap().log_format, LogFormat::Pretty);
        assert!(matches!(
            config(&[("WORKHUB_REQUEST_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidRequestTimeout(_))
        ));
        assert_eq!(
            config(&[("WORKHUB_REQUEST_TIMEOUT_SECS", "5")]).unwrap().request_timeout,
            Duration::from_secs(5)
        );
    }
}
