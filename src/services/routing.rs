//! Portal route table and its deferred refresh.
//!
//! DESIGN
//! ======
//! The route table maps public paths under `/{portal_route}` to a portal
//! target. It is derived from settings, menu items, and published pages.
//!
//! Edits never rebuild the table inline. They call [`RouteRefresh::schedule`],
//! which only raises a pending flag; the next request that consults the
//! table, or the next tick of the background refresh task, performs a single
//! rebuild. Any number of rapid edits between two rebuilds coalesce.
//!
//! ERROR HANDLING
//! ==============
//! A failed rebuild re-raises the pending flag and keeps serving the previous
//! table, so the next cycle retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::services::menu::{self, MenuError, MenuItem};
use crate::services::options::OptionStore;
use crate::services::pages::{ContentProvider, PageError, PageSummary};
use crate::services::settings::{self, Settings, SettingsError};
use crate::state::AppState;

/// Upper bound on pages considered for slug routes per rebuild.
const ROUTABLE_PAGE_LIMIT: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Pages(#[from] PageError),
}

impl ErrorCode for RoutingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Settings(e) => e.error_code(),
            Self::Menu(e) => e.error_code(),
            Self::Pages(e) => e.error_code(),
        }
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum RouteTarget {
    Home,
    Dashboard,
    Page { page_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    portal_route: String,
    /// Keyed by the single path segment after the portal route.
    entries: HashMap<String, RouteTarget>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::build(&Settings::default(), &[], &[])
    }
}

impl RouteTable {
    /// Derive the table. Precedence: dashboard route, then custom menu
    /// routes (only with `enable_custom_urls`), then page slugs.
    #[must_use]
    pub fn build(settings: &Settings, menu_items: &[MenuItem], pages: &[PageSummary]) -> Self {
        let mut entries = HashMap::new();
        entries.insert(settings.dashboard_route.clone(), RouteTarget::Dashboard);

        if settings.enable_custom_urls {
            for item in menu::flatten(menu_items) {
                if !item.custom_route.is_empty() {
                    entries
                        .entry(item.custom_route.clone())
                        .or_insert(RouteTarget::Page { page_id: item.page_id });
                }
            }
        }

        for page in pages {
            if !page.slug.is_empty() {
                entries
                    .entry(page.slug.clone())
                    .or_insert(RouteTarget::Page { page_id: page.id });
            }
        }

        Self { portal_route: settings.portal_route.clone(), entries }
    }

    /// Resolve a request path such as `/portal/billing`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteTarget> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != self.portal_route {
            return None;
        }
        match (segments.next(), segments.next()) {
            (None, _) => Some(RouteTarget::Home),
            (Some(segment), None) => self.entries.get(segment).copied(),
            (Some(_), Some(_)) => None,
        }
    }

    #[must_use]
    pub fn portal_route(&self) -> &str {
        &self.portal_route
    }

    /// Number of segment routes, excluding the portal home.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// DEFERRED REFRESH
// =============================================================================

/// Shared route table plus its pending-refresh flag. Clone is cheap.
#[derive(Clone)]
pub struct RouteRefresh {
    pending: Arc<AtomicBool>,
    table: Arc<RwLock<RouteTable>>,
}

impl Default for RouteRefresh {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRefresh {
    /// Starts pending so the first cycle builds from stored state.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: Arc::new(AtomicBool::new(true)), table: Arc::new(RwLock::new(RouteTable::default())) }
    }

    /// Request a rebuild on the next cycle.
    pub fn schedule(&self) {
        self.pending.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Rebuild if a refresh is pending. Returns whether a rebuild happened.
    ///
    /// The table's write lock is held for the whole rebuild, so a resolve
    /// that arrives mid-rebuild waits for the new table.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error; the refresh stays pending.
    pub async fn refresh_if_pending(
        &self,
        options: &dyn OptionStore,
        pages: &dyn ContentProvider,
    ) -> Result<bool, RoutingError> {
        if !self.is_pending() {
            return Ok(false);
        }
        let mut current = self.table.write().await;
        if !self.pending.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        match build_table(options, pages).await {
            Ok(table) => {
                info!(portal_route = table.portal_route(), routes = table.len(), "route table rebuilt");
                *current = table;
                Ok(true)
            }
            Err(e) => {
                self.schedule();
                Err(e)
            }
        }
    }

    pub async fn resolve(&self, path: &str) -> Option<RouteTarget> {
        self.table.read().await.resolve(path)
    }
}

async fn build_table(options: &dyn OptionStore, pages: &dyn ContentProvider) -> Result<RouteTable, RoutingError> {
    let settings = settings::load_settings(options).await?;
    let menu_items = menu::load_menu_items(options).await?;
    let summaries = pages.list_published(ROUTABLE_PAGE_LIMIT).await?;
    Ok(RouteTable::build(&settings, &menu_items, &summaries))
}

/// Spawn the background refresh task. Returns a handle for shutdown.
pub fn spawn_route_refresh_task(state: AppState, interval_ms: u64) -> JoinHandle<()> {
    info!(interval_ms, "route refresh task configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = state
                .routes
                .refresh_if_pending(state.options.as_ref(), state.pages.as_ref())
                .await
            {
                warn!(error = %e, "route table refresh failed; will retry");
            }
        }
    })
}

#[cfg(test)]
#[path = "routing_test.rs"]
mod tests;
