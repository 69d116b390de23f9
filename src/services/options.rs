//! Option store — named JSON records in a generic key-value table.
//!
//! DESIGN
//! ======
//! Settings, menu items, and widgets are each persisted as one named value
//! in `portal_options`. Writes replace the whole value; there is no version
//! column, so concurrent writers resolve as last-write-wins.
//!
//! The Postgres implementation backs production; the in-memory one backs
//! tests and `PORTAL_STORAGE=memory` deployments.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ErrorCode;

pub const SETTINGS_OPTION: &str = "site_portal_settings";
pub const MENU_ITEMS_OPTION: &str = "site_portal_menu_items";
pub const WIDGETS_OPTION: &str = "site_portal_widgets";
pub const VERSION_OPTION: &str = "site_portal_version";

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored option {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_STORAGE",
            Self::Malformed { .. } => "E_STORAGE_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Named-record storage. Enables swapping Postgres for memory in tests.
#[async_trait::async_trait]
pub trait OptionStore: Send + Sync {
    /// Fetch an option value, `None` if it was never written.
    async fn get_option(&self, name: &str) -> Result<Option<Value>, StoreError>;

    /// Insert or replace an option value.
    async fn update_option(&self, name: &str, value: &Value) -> Result<(), StoreError>;

    /// Insert only if absent. Returns `true` when the value was written.
    async fn add_option(&self, name: &str, value: &Value) -> Result<bool, StoreError>;

    /// Remove an option. Absent names are not an error.
    async fn delete_option(&self, name: &str) -> Result<(), StoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgOptionStore {
    pool: PgPool,
}

impl PgOptionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OptionStore for PgOptionStore {
    async fn get_option(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let value = sqlx::query_scalar::<_, Value>("SELECT value FROM portal_options WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn update_option(&self, name: &str, value: &Value) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO portal_options (name, value)
              VALUES ($1, $2)
              ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_option(&self, name: &str, value: &Value) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO portal_options (name, value)
              VALUES ($1, $2)
              ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_option(&self, name: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM portal_options WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default, Clone)]
pub struct MemoryOptionStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryOptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl OptionStore for MemoryOptionStore {
    async fn get_option(&self, name: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(name).cloned())
    }

    async fn update_option(&self, name: &str, value: &Value) -> Result<(), StoreError> {
        self.values.write().await.insert(name.to_owned(), value.clone());
        Ok(())
    }

    async fn add_option(&self, name: &str, value: &Value) -> Result<bool, StoreError> {
        let mut values = self.values.write().await;
        if values.contains_key(name) {
            return Ok(false);
        }
        values.insert(name.to_owned(), value.clone());
        Ok(true)
    }

    async fn delete_option(&self, name: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(name);
        Ok(())
    }
}

// =============================================================================
// ACTIVATION
// =============================================================================

/// Seed the default settings record and schema version if absent.
/// Existing configuration is never overwritten.
///
/// # Errors
///
/// Returns a store error if either insert fails.
pub async fn install_defaults(store: &dyn OptionStore) -> Result<(), StoreError> {
    let defaults = serde_json::to_value(crate::services::settings::Settings::default()).map_err(|e| {
        StoreError::Malformed { name: SETTINGS_OPTION.to_owned(), reason: e.to_string() }
    })?;
    let seeded = store.add_option(SETTINGS_OPTION, &defaults).await?;
    let versioned = store
        .add_option(VERSION_OPTION, &Value::String(SCHEMA_VERSION.to_owned()))
        .await?;
    info!(seeded, versioned, version = SCHEMA_VERSION, "portal options installed");
    Ok(())
}

/// Delete every portal option. Pages, users, and sessions are untouched.
///
/// # Errors
///
/// Returns the first store error; earlier deletes are not rolled back.
pub async fn remove_all(store: &dyn OptionStore) -> Result<(), StoreError> {
    for name in [SETTINGS_OPTION, MENU_ITEMS_OPTION, WIDGETS_OPTION, VERSION_OPTION] {
        store.delete_option(name).await?;
    }
    info!("portal options removed");
    Ok(())
}

#[cfg(test)]
#[path = "options_test.rs"]
mod tests;
