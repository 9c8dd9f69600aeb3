//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use folio_auth::DEFAULT_BCRYPT_COST;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when any ADMIN_* variable is set")]
    Missing(&'static str),
}

/// Credentials for an Admin account created at startup if missing.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub bcrypt_cost: u32,
    pub admin: Option<AdminBootstrap>,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// In-memory configuration with defaults; used by tests and local runs.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: jwt_secret.into(),
            token_ttl: chrono::Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            database_url: None,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl = match get("TOKEN_TTL_MINUTES") {
            None => chrono::Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => chrono::Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TOKEN_TTL_MINUTES",
                        value: raw,
                        reason: "expected a positive number of minutes".to_string(),
                    });
                }
            },
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            None => DEFAULT_BCRYPT_COST,
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "BCRYPT_COST",
                        value: raw,
                        reason: "expected an integer between 4 and 31".to_string(),
                    });
                }
            },
        };

        let admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD"), get("ADMIN_EMAIL")) {
            (None, None, None) => None,
            (Some(username), Some(password), Some(email)) => Some(AdminBootstrap { username, password, email }),
            (None, _, _) => return Err(ConfigError::Missing("ADMIN_USERNAME")),
            (_, None, _) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (_, _, None) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            database_url: get("DATABASE_URL"),
            bcrypt_cost,
            admin,
        })
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_admin(mut self, admin: AdminBootstrap) -> Self {
        self.admin = Some(admin);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(60));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.admin, None);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_MINUTES", "15"),
            ("DATABASE_URL", "postgres://localhost/folio"),
            ("BCRYPT_COST", "4"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "change-me-now"),
            ("ADMIN_EMAIL", "root@example.com"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/folio"));
        assert_eq!(cfg.bcrypt_cost, 4);
        assert_eq!(cfg.admin.unwrap().username, "root");
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert_eq!(config(&[("DATABASE_URL", "  ")]).unwrap().database_url, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(config(&[("BIND_ADDR", "nowhere")]), Err(ConfigError::Invalid { var: "BIND_ADDR", .. })));
        assert!(matches!(config(&[("TOKEN_TTL_MINUTES", "0")]), Err(ConfigError::Invalid { .. })));
        assert!(matches!(config(&[("BCRYPT_COST", "99")]), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn partial_admin_bootstrap_is_an_error() {
        assert_eq!(
            config(&[("ADMIN_USERNAME", "root")]).unwrap_err(),
            ConfigError::Missing("ADMIN_PASSWORD")
        );
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = ApiConfig::in_memory("top-secret").with_admin(AdminBootstrap {
            username: "root".to_string(),
            password: "hunter22".to_string(),
            email: "root@example.com".to_string(),
        });
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("top-secret"));
        assert!(!shown.contains("hunter22"));
    }
}
