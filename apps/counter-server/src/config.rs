//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use counter_core::domain::VoteOrdering;
use counter_infra::KvConfigError;

use crate::middleware::cors::CorsPolicy;

/// Which key-value store backs the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvBackend {
    Upstash,
    Redis,
    Memory,
}

impl FromStr for KvBackend {
    type Err = KvConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upstash" => Ok(Self::Upstash),
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(KvConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Kv(#[from] KvConfigError),

    #[error("Invalid VOTE_ORDERING: {0}")]
    Ordering(String),

    #[error("Invalid PORT: {0}")]
    Port(String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub kv_backend: KvBackend,
    /// Header carrying the client address, set by the edge in front of us.
    pub client_ip_header: String,
    pub cors: CorsPolicy,
    pub vote_ordering: VoteOrdering,
    /// `hosting` label reported by the health endpoint.
    pub hosting: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            kv_backend: KvBackend::Upstash,
            client_ip_header: "CF-Connecting-IP".to_string(),
            cors: CorsPolicy::default(),
            vote_ordering: VoteOrdering::default(),
            hosting: "cloudflare-workers".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Port(raw))?,
            Err(_) => defaults.port,
        };

        let kv_backend = match env::var("KV_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.kv_backend,
        };

        let vote_ordering = match env::var("VOTE_ORDERING") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Ordering(raw))?,
            Err(_) => defaults.vote_ordering,
        };

        let mut cors = defaults.cors;
        if let Ok(primary) = env::var("CORS_PRIMARY_ORIGIN") {
            cors.primary_origin = primary;
        }
        if let Ok(dev) = env::var("CORS_DEV_ORIGINS") {
            cors.dev_origins = dev
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            kv_backend,
            client_ip_header: env::var("CLIENT_IP_HEADER").unwrap_or(defaults.client_ip_header),
            cors,
            vote_ordering,
            hosting: env::var("HOSTING_LABEL").unwrap_or(defaults.hosting),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!("upstash".parse::<KvBackend>().unwrap(), KvBackend::Upstash);
        assert_eq!(" Redis ".parse::<KvBackend>().unwrap(), KvBackend::Redis);
        assert_eq!("memory".parse::<KvBackend>().unwrap(), KvBackend::Memory);
        assert!(matches!(
            "dynamo".parse::<KvBackend>(),
            Err(KvConfigError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8787);
        assert_eq!(config.client_ip_header, "CF-Connecting-IP");
        assert_eq!(config.vote_ordering, VoteOrdering::IncrementThenMark);
        assert_eq!(config.cors.primary_origin, "https://1mb.dev");
    }
}
