// Configuration lue depuis l'environnement (+ fichier .env)

use std::env;

use chrono::Duration;
use thiserror::Error;

const DEFAULT_AUTH_SECRET: &str = "default-insecure-secret-change-this";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Clé HMAC pour signer le cookie de session
    pub secret: String,
    pub session_ttl: Duration,
    pub verification_ttl: Duration,
    /// URL publique, utilisée pour construire le lien de vérification
    pub base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_AUTH_SECRET.to_string(),
            session_ttl: Duration::days(7),
            verification_ttl: Duration::hours(24),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auto_migrate: bool,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("PORT", 8080u16)?;
        let auto_migrate = parse_bool("AUTO_MIGRATE", true)?;

        let defaults = AuthConfig::default();
        let secret = env::var("AUTH_SECRET").unwrap_or_else(|_| {
            tracing::warn!("AUTH_SECRET not found in .env, using default (INSECURE)");
            defaults.secret.clone()
        });
        let session_ttl = session_ttl(parse_var("SESSION_TTL_DAYS", 7i64)?)?;
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Ok(Self {
            database_url,
            host,
            port,
            auto_migrate,
            auth: AuthConfig {
                secret,
                session_ttl,
                verification_ttl: defaults.verification_ttl,
                base_url,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Durée de session en jours: > 0 et représentable par chrono
fn session_ttl(days: i64) -> Result<Duration, ConfigError> {
    Duration::try_days(days)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or(ConfigError::Invalid {
            name: "SESSION_TTL_DAYS",
            value: days.to_string(),
        })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        Err(_) => Ok(default),
    }
}
