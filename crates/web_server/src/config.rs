//! Server configuration read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use auth_services::jwt::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, JwtSettings};
use notification_services::rabbitmq::DEFAULT_CONNECT_ATTEMPTS;

/// Errors raised while reading the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("{key} is invalid: {message}")]
    Invalid {
        /// Name of the variable
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Administrator account created or promoted at startup
#[derive(Debug, Clone)]
pub struct AdminAccount {
    /// Display name used when the account is created
    pub name: String,
    /// Email address of the account
    pub email: String,
    /// Password used when the account is created
    pub password: String,
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    /// AMQP connection string of the broker
    pub rabbitmq_url: String,
    /// Broker connection attempts before a publish fails
    pub rabbitmq_connect_attempts: u32,
    /// PKCS#8 PEM file of the signing key
    pub jwt_private_key_path: PathBuf,
    /// SPKI PEM file of the verification key
    pub jwt_public_key_path: PathBuf,
    /// Token lifetimes, identities and the reset secret
    pub jwt: JwtSettings,
    /// Optional bootstrap administrator
    pub admin: Option<AdminAccount>,
}

impl ServerConfig {
    /// Loads `.env` (or `.env.dev` when `APP_ENV=dev`) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_file = match env::var("APP_ENV").as_deref() {
            Ok("dev") => ".env.dev",
            _ => ".env",
        };
        dotenvy::from_filename(env_file).ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                message: e.to_string(),
            })?,
            None => 3003,
        };

        let rabbitmq_connect_attempts = match get("RABBITMQ_CONNECT_ATTEMPTS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "RABBITMQ_CONNECT_ATTEMPTS",
                message: e.to_string(),
            })?,
            None => DEFAULT_CONNECT_ATTEMPTS,
        };

        let mut jwt = JwtSettings::new(
            get("JWT_RESET_SECRET").ok_or(ConfigError::Missing("JWT_RESET_SECRET"))?,
        );
        jwt.issuer = get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        jwt.audience = get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());
        if let Some(raw) = get("JWT_EXPIRATION") {
            jwt.access_ttl = parse_expiration(&raw)?;
        }
        if let Some(raw) = get("JWT_RESET_SECRET_EXPIRATION") {
            let minutes = raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "JWT_RESET_SECRET_EXPIRATION",
                message: e.to_string(),
            })?;
            jwt.reset_ttl = chrono::Duration::minutes(i64::from(minutes));
        }

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminAccount {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            rabbitmq_url: get("RABBITMQ_URL").unwrap_or_else(|| "amqp://rabbitmq:5672".to_string()),
            rabbitmq_connect_attempts,
            jwt_private_key_path: get("JWT_PRIVATE_KEY_PATH")
                .unwrap_or_else(|| "certs/jwt-private.pkcs8.pem".to_string())
                .into(),
            jwt_public_key_path: get("JWT_PUBLIC_KEY_PATH")
                .unwrap_or_else(|| "certs/jwt-public.spki.pem".to_string())
                .into(),
            jwt,
            admin,
        })
    }
}

/// Parses an access token lifetime: bare seconds (`3600`) or a humantime span (`1h`, `30m`).
fn parse_expiration(raw: &str) -> Result<chrono::Duration, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "JWT_EXPIRATION",
        message,
    };

    let std_duration = match raw.parse::<u64>() {
        Ok(secs) => StdDuration::from_secs(secs),
        Err(_) => humantime::parse_duration(raw).map_err(|e| invalid(e.to_string()))?,
    };

    if std_duration.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }

    chrono::Duration::from_std(std_duration).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/users"),
        ("JWT_RESET_SECRET", "reset-secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.port, 3003);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.rabbitmq_url, "amqp://rabbitmq:5672");
        assert_eq!(config.rabbitmq_connect_attempts, DEFAULT_CONNECT_ATTEMPTS);
        assert_eq!(config.jwt.access_ttl, chrono::Duration::hours(1));
        assert_eq!(config.jwt.reset_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.jwt.issuer, DEFAULT_ISSUER);
        assert_eq!(
            config.jwt_private_key_path,
            PathBuf::from("certs/jwt-private.pkcs8.pem")
        );
        assert!(config.admin.is_none());
    }

    #[test]
    fn reset_secret_is_required() {
        let err = ServerConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_RESET_SECRET")));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("JWT_EXPIRATION", "30m"),
            ("JWT_RESET_SECRET_EXPIRATION", "5"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "changeme"),
        ]);

        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt.access_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.jwt.reset_ttl, chrono::Duration::minutes(5));
        let admin = config.admin.unwrap();
        assert_eq!(admin.email, "root@example.com");
        assert_eq!(admin.name, "Administrator");
    }

    #[test]
    fn expiration_accepts_seconds_and_rejects_garbage() {
        assert_eq!(parse_expiration("3600").unwrap(), chrono::Duration::hours(1));
        assert_eq!(parse_expiration("2h").unwrap(), chrono::Duration::hours(2));
        assert!(parse_expiration("soon").is_err());
        assert!(parse_expiration("0").is_err());
    }

    #[test]
    fn bad_port_is_reported() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "http"));

        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
