use std::env;

use thiserror::Error;

const DEFAULT_BCRYPT_COST: u32 = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings, read once at startup and handed to the components that
/// need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,
    /// Token lifetime. `None` keeps tokens valid until revoked.
    pub token_ttl_hours: Option<i64>,
    pub bcrypt_cost: u32,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                reason: format!("'{}' is not a port number", raw),
            })?,
            None => 8080,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => {
                let cost: u32 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "BCRYPT_COST",
                    reason: format!("'{}' is not a number", raw),
                })?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        reason: "must be between 4 and 31".into(),
                    });
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let token_ttl_hours = match lookup("TOKEN_TTL_HOURS") {
            Some(raw) => {
                let hours: i64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "TOKEN_TTL_HOURS",
                    reason: format!("'{}' is not a number", raw),
                })?;
                if hours <= 0 {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_HOURS",
                        reason: "must be positive".into(),
                    });
                }
                Some(hours)
            }
            None => None,
        };

        Ok(Self {
            database_url,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            mail_from: lookup("MAIL_FROM").unwrap_or_else(|| "noreply@taskdesk.local".to_string()),
        })
    }

    /// Settings for tests: no database, cheapest bcrypt cost.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            server_port: 0,
            server_host: "127.0.0.1".to_string(),
            jwt_secret: jwt_secret.to_string(),
            token_ttl_hours: None,
            bcrypt_cost: 4,
            mail_from: "noreply@taskdesk.local".to_string(),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.bcrypt_cost, 8);
        assert_eq!(config.token_ttl_hours, None);
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("BCRYPT_COST", "10"),
            ("TOKEN_TTL_HOURS", "24"),
            ("MAIL_FROM", "team@example.com"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.token_ttl_hours, Some(24));
        assert_eq!(config.mail_from, "team@example.com");
    }

    #[test]
    fn test_config_requires_secret() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://test")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let base = [("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "s")];

        let mut vars = base.to_vec();
        vars.push(("SERVER_PORT", "eighty"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        let mut vars = base.to_vec();
        vars.push(("BCRYPT_COST", "2"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        let mut vars = base.to_vec();
        vars.push(("TOKEN_TTL_HOURS", "0"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }
}
