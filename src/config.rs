use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::application::DEFAULT_POLL_INTERVAL;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub docker_host: String,
    /// Bounds a whole API request and each per-container fetch inside it
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// API root the terminal client polls
    pub api_url: String,
    pub skip_overlapping: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup("DOCKPULSE_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5001),
            docker_host: lookup("DOCKER_HOST").unwrap_or_else(|| "unix:///var/run/docker.sock".to_string()),
            request_timeout: Duration::from_secs(
                lookup("DOCKPULSE_REQUEST_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            poll_interval: lookup("DOCKPULSE_POLL_INTERVAL")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            api_url: lookup("DOCKPULSE_API_URL").unwrap_or_else(|| "http://localhost:5001/api".to_string()),
            skip_overlapping: lookup("DOCKPULSE_SKIP_OVERLAPPING")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
            log_level: lookup("DOCKPULSE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Zero("DOCKPULSE_PORT"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("DOCKPULSE_REQUEST_TIMEOUT"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("DOCKPULSE_POLL_INTERVAL"));
        }
        if !(self.docker_host.starts_with("unix://") || self.docker_host.starts_with('/')) {
            return Err(ConfigError::Invalid {
                name: "DOCKER_HOST",
                expected: "name a local unix socket",
                value: self.docker_host.clone(),
            });
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "DOCKPULSE_API_URL",
                expected: "be an http(s) URL",
                value: self.api_url.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_cover_a_local_docker_host() {
        let config = config(&[]);
        assert_eq!(config.port, 5001);
        assert_eq!(config.docker_host, "unix:///var/run/docker.sock");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.api_url, "http://localhost:5001/api");
        assert!(!config.skip_overlapping);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DOCKPULSE_PORT", "8080"),
            ("DOCKER_HOST", "/run/user/1000/docker.sock"),
            ("DOCKPULSE_REQUEST_TIMEOUT", "3"),
            ("DOCKPULSE_POLL_INTERVAL", "30"),
            ("DOCKPULSE_SKIP_OVERLAPPING", "true"),
            ("DOCKPULSE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.docker_host, "/run/user/1000/docker.sock");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert!(config.skip_overlapping);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config(&[("DOCKPULSE_PORT", "http"), ("DOCKPULSE_POLL_INTERVAL", "-1")]);
        assert_eq!(config.port, 5001);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn validation_rejects_zero_durations() {
        let err = config(&[("DOCKPULSE_REQUEST_TIMEOUT", "0")]).validate().unwrap_err();
        assert_eq!(err, ConfigError::Zero("DOCKPULSE_REQUEST_TIMEOUT"));
        assert!(err.to_string().contains("greater than zero"));

        let err = config(&[("DOCKPULSE_POLL_INTERVAL", "0")]).validate().unwrap_err();
        assert_eq!(err, ConfigError::Zero("DOCKPULSE_POLL_INTERVAL"));
    }

    #[test]
    fn validation_rejects_tcp_docker_host() {
        let err = config(&[("DOCKER_HOST", "tcp://10.0.0.5:2375")]).validate().unwrap_err();
        assert!(err.to_string().contains("DOCKER_HOST"));
    }

    #[test]
    fn validation_rejects_non_http_api_url() {
        let err = config(&[("DOCKPULSE_API_URL", "localhost:5001")]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DOCKPULSE_API_URL", .. }));
    }
}
