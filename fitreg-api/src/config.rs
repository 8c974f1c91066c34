use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;
use log::{info, warn};

/// One week.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {key} value \"{value}\": {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStorage {
    Directory,
    Database,
}

impl FromStr for PhotoStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "directory" => Ok(PhotoStorage::Directory),
            "database" => Ok(PhotoStorage::Database),
            _ => Err("expected \"directory\" or \"database\"".to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub photo_storage: PhotoStorage,
    pub photo_dir: PathBuf,
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token_ttl_minutes: i64 = try_load(&lookup, "TOKEN_TTL_MINUTES", "60")?;
        let token_ttl = Some(token_ttl_minutes)
            .filter(|minutes| (1..=MAX_TOKEN_TTL_MINUTES).contains(minutes))
            .and_then(Duration::try_minutes)
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
                reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_MINUTES),
            })?;

        Ok(Self {
            bind_address: try_load(&lookup, "BIND_ADDRESS", "127.0.0.1")?,
            port: try_load(&lookup, "PORT", "8080")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            token_ttl,
            photo_storage: try_load(&lookup, "PHOTO_STORAGE", "directory")?,
            photo_dir: try_load(&lookup, "PHOTO_DIR", "photos")?,
            export_dir: lookup("EXPORT_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!("Environment variable {} not found", key);
            ConfigError::Missing(key)
        })
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{} not set, using default: {}", key, default);
        default.to_owned()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = load(&[("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "s")]).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl, Duration::minutes(60));
        assert_eq!(config.photo_storage, PhotoStorage::Directory);
        assert_eq!(config.photo_dir, PathBuf::from("photos"));
        assert_eq!(config.export_dir, None);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("DATABASE_URL", "sqlite://fitreg.db"),
            ("JWT_SECRET", "s"),
            ("PORT", "9000"),
            ("TOKEN_TTL_MINUTES", "15"),
            ("PHOTO_STORAGE", "Database"),
            ("EXPORT_DIR", "csv"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.token_ttl, Duration::minutes(15));
        assert_eq!(config.photo_storage, PhotoStorage::Database);
        assert_eq!(config.export_dir, Some(PathBuf::from("csv")));
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            load(&[("DATABASE_URL", "sqlite::memory:")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "s")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn token_ttl_is_capped() {
        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "s"),
            ("TOKEN_TTL_MINUTES", "10080"),
        ])
        .unwrap();
        assert_eq!(config.token_ttl, Duration::minutes(MAX_TOKEN_TTL_MINUTES));

        let huge = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "s"),
            ("TOKEN_TTL_MINUTES", "100000000000000"),
        ]);
        assert!(matches!(
            huge,
            Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                ..
            })
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        let base = [("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "s")];

        for (key, value) in [
            ("PORT", "eighty"),
            ("TOKEN_TTL_MINUTES", "0"),
            ("TOKEN_TTL_MINUTES", "-5"),
            ("TOKEN_TTL_MINUTES", "10081"),
            ("TOKEN_TTL_MINUTES", "100000000000000"),
            ("TOKEN_TTL_MINUTES", "9223372036854775807"),
            ("PHOTO_STORAGE", "gridfs"),
        ] {
            let mut vars = base.to_vec();
            vars.push((key, value));
            match load(&vars) {
                Err(ConfigError::Invalid { key: k, .. }) => assert_eq!(k, key),
                other => panic!("{}={} accepted: {:?}", key, value, other),
            }
        }
    }
}
