use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use url::Url;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.reelsaver.app/api/download";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

/// Settings read once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub upstream_url: Url,
    pub upstream_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            allowed_origins: AllowedOrigins::Any,
            upstream_url: Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream URL is valid"),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads `HOST`, `PORT`, `ALLOWED_ORIGINS`, `UPSTREAM_URL` and
    /// `UPSTREAM_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("HOST") {
            config.host = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("HOST", &raw, e))?;
        }
        if let Some(raw) = get("PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &raw, e))?;
        }
        if let Some(raw) = get("ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&raw);
        }
        if let Some(raw) = get("UPSTREAM_URL") {
            let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid("UPSTREAM_URL", &raw, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::invalid("UPSTREAM_URL", &raw, "scheme must be http or https"));
            }
            config.upstream_url = url;
        }
        if let Some(raw) = get("UPSTREAM_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", &raw, e))?;
            if secs == 0 {
                return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", &raw, "must be positive"));
            }
            config.upstream_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| o.trim_end_matches('/').to_string())
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.allowed_origins, AllowedOrigins::Any);
        assert_eq!(config.upstream_url.as_str(), DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("ALLOWED_ORIGINS", "https://app.example.com/, http://localhost:5173,,"),
            ("UPSTREAM_URL", "http://127.0.0.1:9000/api"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8081");
        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec![
                "https://app.example.com".to_string(),
                "http://localhost:5173".to_string(),
            ])
        );
        assert_eq!(config.upstream_url.as_str(), "http://127.0.0.1:9000/api");
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn wildcard_origin_means_any() {
        let config = from_pairs(&[("ALLOWED_ORIGINS", "https://a.example, *")]).unwrap();
        assert_eq!(config.allowed_origins, AllowedOrigins::Any);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from_pairs(&[("PORT", "http")]).is_err());
        assert!(from_pairs(&[("PORT", "70000")]).is_err());
        assert!(from_pairs(&[("HOST", "localhost:3")]).is_err());
        assert!(from_pairs(&[("UPSTREAM_URL", "not a url")]).is_err());
        assert!(from_pairs(&[("UPSTREAM_URL", "ftp://files.example/x")]).is_err());
        assert!(from_pairs(&[("UPSTREAM_TIMEOUT_SECS", "0")]).is_err());

        let err = from_pairs(&[("UPSTREAM_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().starts_with("UPSTREAM_TIMEOUT_SECS"));
    }
}
