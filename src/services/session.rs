//! Sessions, users, and role capabilities.
//!
//! ARCHITECTURE
//! ============
//! Callers authenticate with an opaque bearer token. Only the SHA-256 of a
//! token is stored, so a leaked sessions table cannot be replayed. Each user
//! has one role; the `manage_options` capability (required for every write
//! endpoint) belongs to administrators only.

use std::collections::HashMap;
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_STORAGE",
            Self::UnknownRole(_) => "E_STORAGE_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

// =============================================================================
// ROLES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

/// Editable roles in display order.
pub const ROLES: [Role; 5] = [Role::Administrator, Role::Editor, Role::Author, Role::Contributor, Role::Subscriber];

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Editor => "editor",
            Self::Author => "author",
            Self::Contributor => "contributor",
            Self::Subscriber => "subscriber",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Editor => "Editor",
            Self::Author => "Author",
            Self::Contributor => "Contributor",
            Self::Subscriber => "Subscriber",
        }
    }

    /// Capability gating every configuration write.
    #[must_use]
    pub fn can_manage_options(self) -> bool {
        matches!(self, Self::Administrator)
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ROLES
            .into_iter()
            .find(|role| role.as_str() == raw)
            .ok_or_else(|| SessionError::UnknownRole(raw.to_owned()))
    }
}

// =============================================================================
// TOKENS
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Hex SHA-256 of a token, the form stored in `sessions`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// User resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve an unexpired session token to its user.
    async fn validate(&self, token: &str) -> Result<Option<SessionUser>, SessionError>;

    /// Upsert a user by name with `role` and bind `token` to it.
    async fn ensure_user_session(&self, name: &str, role: Role, token: &str) -> Result<SessionUser, SessionError>;

    async fn count_users(&self) -> Result<i64, SessionError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn validate(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        let row = sqlx::query(
            r"SELECT u.id, u.name, u.role
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              WHERE s.token_hash = $1 AND s.expires_at > now()",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let role_raw: String = row.get("role");
        let role: Role = role_raw.parse()?;
        Ok(Some(SessionUser { id: row.get("id"), name: row.get("name"), role }))
    }

    async fn ensure_user_session(&self, name: &str, role: Role, token: &str) -> Result<SessionUser, SessionError> {
        let mut tx = self.pool.begin().await?;
        let id: Uuid = sqlx::query_scalar(
            r"INSERT INTO users (name, role)
              VALUES ($1, $2)
              ON CONFLICT (name) DO UPDATE SET role = EXCLUDED.role
              RETURNING id",
        )
        .bind(name)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"INSERT INTO sessions (token_hash, user_id)
              VALUES ($1, $2)
              ON CONFLICT (token_hash) DO UPDATE
              SET user_id = EXCLUDED.user_id, expires_at = now() + interval '30 days'",
        )
        .bind(hash_token(token))
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(SessionUser { id, name: name.to_owned(), role })
    }

    async fn count_users(&self) -> Result<i64, SessionError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default)]
struct MemorySessions {
    users: HashMap<String, SessionUser>,
    /// token hash -> user name
    sessions: HashMap<String, String>,
}

/// In-memory sessions. Sessions never expire.
#[derive(Default, Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<MemorySessions>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn validate(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(&hash_token(token))
            .and_then(|name| inner.users.get(name))
            .cloned())
    }

    async fn ensure_user_session(&self, name: &str, role: Role, token: &str) -> Result<SessionUser, SessionError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .entry(name.to_owned())
            .and_modify(|u| u.role = role)
            .or_insert_with(|| SessionUser { id: Uuid::new_v4(), name: name.to_owned(), role })
            .clone();
        inner.sessions.insert(hash_token(token), name.to_owned());
        Ok(user)
    }

    async fn count_users(&self) -> Result<i64, SessionError> {
        Ok(i64::try_from(self.inner.read().await.users.len()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
