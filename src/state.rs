//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the three storage seams as trait objects plus the shared route
//! table. No request holds a lock across a storage call; each operation is
//! an independent read or whole-value write.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::options::{MemoryOptionStore, OptionStore, PgOptionStore};
use crate::services::pages::{ContentProvider, MemoryContentProvider, PgContentProvider};
use crate::services::routing::RouteRefresh;
use crate::services::session::{MemorySessionStore, PgSessionStore, SessionStore};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub options: Arc<dyn OptionStore>,
    pub pages: Arc<dyn ContentProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub routes: RouteRefresh,
}

impl AppState {
    #[must_use]
    pub fn new(
        options: Arc<dyn OptionStore>,
        pages: Arc<dyn ContentProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self { options, pages, sessions, routes: RouteRefresh::new() }
    }

    /// All stores backed by one Postgres pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgOptionStore::new(pool.clone())),
            Arc::new(PgContentProvider::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool)),
        )
    }

    /// Volatile option and session stores over the given pages.
    #[must_use]
    pub fn memory(pages: MemoryContentProvider) -> Self {
        Self::new(
            Arc::new(MemoryOptionStore::new()),
            Arc::new(pages),
            Arc::new(MemorySessionStore::new()),
        )
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::pages::ContentPage;
    use crate::services::session::Role;

    pub const ADMIN_TOKEN: &str = "admin-test-token";
    pub const MEMBER_TOKEN: &str = "member-test-token";

    /// Handles onto the in-memory stores behind a test `AppState`.
    pub struct TestApp {
        pub state: AppState,
        pub options: MemoryOptionStore,
        pub pages: MemoryContentProvider,
    }

    /// Memory-backed state with an administrator (`ADMIN_TOKEN`) and a
    /// subscriber (`MEMBER_TOKEN`) session.
    pub async fn test_app() -> TestApp {
        let options = MemoryOptionStore::new();
        let pages = MemoryContentProvider::new();
        let sessions = MemorySessionStore::new();
        sessions
            .ensure_user_session("admin", Role::Administrator, ADMIN_TOKEN)
            .await
            .expect("memory session insert should not fail");
        sessions
            .ensure_user_session("member", Role::Subscriber, MEMBER_TOKEN)
            .await
            .expect("memory session insert should not fail");

        let state = AppState::new(Arc::new(options.clone()), Arc::new(pages.clone()), Arc::new(sessions));
        TestApp { state, options, pages }
    }

    /// A published page with the given id, title, and body.
    #[must_use]
    pub fn page(id: i64, title: &str, content: &str) -> ContentPage {
        ContentPage {
            id,
            title: title.to_owned(),
            slug: crate::sanitize::slugify(title),
            content: content.to_owned(),
            excerpt: String::new(),
            status: "publish".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_state_starts_empty() {
        let state = AppState::memory(MemoryContentProvider::new());
        assert!(state.options.get_option("anything").await.unwrap().is_none());
        assert_eq!(state.pages.count_published().await.unwrap(), 0);
        assert_eq!(state.sessions.count_users().await.unwrap(), 0);
        assert!(state.routes.is_pending());
    }

    #[tokio::test]
    async fn test_app_seeds_two_users() {
        let app = test_helpers::test_app().await;
        assert_eq!(app.state.sessions.count_users().await.unwrap(), 2);
        let admin = app.state.sessions.validate(test_helpers::ADMIN_TOKEN).await.unwrap().unwrap();
        assert!(admin.role.can_manage_options());
    }
}
