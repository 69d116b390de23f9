//! Service configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ROUTE_REFRESH_INTERVAL_MS: u64 = 250;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub port: u16,
    pub storage: StorageKind,
    /// Present whenever `storage` is `Postgres`.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub admin_token: Option<String>,
    pub route_refresh_interval_ms: u64,
    pub assets_dir: Option<PathBuf>,
    /// JSON page fixtures for `memory` storage.
    pub seed_pages: Option<PathBuf>,
}

impl PortalConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PORTAL_STORAGE`: `postgres` (default) or `memory`
    /// - `DATABASE_URL`: required when storage is `postgres`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `PORTAL_ADMIN_TOKEN`: bearer token bound to the bootstrap administrator
    /// - `ROUTE_REFRESH_INTERVAL_MS`: default 250
    /// - `PORTAL_ASSETS_DIR`: static renderer bundle served as the fallback
    /// - `PORTAL_SEED_PAGES`: JSON array of pages loaded into `memory` storage
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a missing `DATABASE_URL` or an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = match lookup("PORTAL_STORAGE").as_deref().map(str::trim) {
            None | Some("" | "postgres") => StorageKind::Postgres,
            Some("memory") => StorageKind::Memory,
            Some(other) => return Err(ConfigError::Invalid { var: "PORTAL_STORAGE", value: other.to_owned() }),
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing { var: "DATABASE_URL" });
        }

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            storage,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            admin_token: lookup("PORTAL_ADMIN_TOKEN").filter(|v| !v.trim().is_empty()),
            route_refresh_interval_ms: parse_or(
                &lookup,
                "ROUTE_REFRESH_INTERVAL_MS",
                DEFAULT_ROUTE_REFRESH_INTERVAL_MS,
            )?,
            assets_dir: path_var(&lookup, "PORTAL_ASSETS_DIR"),
            seed_pages: path_var(&lookup, "PORTAL_SEED_PAGES"),
        })
    }
}

fn path_var(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<PathBuf> {
    lookup(var).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
