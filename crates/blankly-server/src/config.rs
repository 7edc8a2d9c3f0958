//! Server configuration parsed from environment variables.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_SHARE_TTL_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// How long an issued share code resolves.
    pub share_ttl: Duration,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            share_ttl: Duration::from_secs(DEFAULT_SHARE_TTL_SECS),
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `BLANKLY_BIND`: listen address, default `0.0.0.0:3001`
    /// - `BLANKLY_SHARE_TTL_SECS`: share-code lifetime, default 120
    /// - `BLANKLY_CORS_ORIGIN`: single allowed origin, default any
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("BLANKLY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "BLANKLY_BIND",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let share_ttl = match lookup("BLANKLY_SHARE_TTL_SECS") {
            None => Duration::from_secs(DEFAULT_SHARE_TTL_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "BLANKLY_SHARE_TTL_SECS",
                        value: raw,
                        reason: "must be positive".into(),
                    });
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "BLANKLY_SHARE_TTL_SECS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        let cors_origin = lookup("BLANKLY_CORS_ORIGIN")
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty() && origin != "*");

        Ok(Self {
            bind,
            share_ttl,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), ServerConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = config(&[
            ("BLANKLY_BIND", "127.0.0.1:9000"),
            ("BLANKLY_SHARE_TTL_SECS", "30"),
            ("BLANKLY_CORS_ORIGIN", "https://board.example"),
        ])
        .unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.share_ttl, Duration::from_secs(30));
        assert_eq!(cfg.cors_origin.as_deref(), Some("https://board.example"));
    }

    #[test]
    fn wildcard_origin_means_any() {
        let cfg = config(&[("BLANKLY_CORS_ORIGIN", "*")]).unwrap();
        assert_eq!(cfg.cors_origin, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("BLANKLY_BIND", "nowhere")]),
            Err(ConfigError::Invalid { var: "BLANKLY_BIND", .. })
        ));
        assert!(matches!(
            config(&[("BLANKLY_SHARE_TTL_SECS", "soon")]),
            Err(ConfigError::Invalid { var: "BLANKLY_SHARE_TTL_SECS", .. })
        ));
        assert!(config(&[("BLANKLY_SHARE_TTL_SECS", "0")]).is_err());
    }
}
