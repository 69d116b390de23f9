use super::*;
use crate::services::options::MemoryOptionStore;
use crate::services::pages::{ContentPage, MemoryContentProvider};
use crate::state::test_helpers::page;
use serde_json::json;
use tokio::sync::Notify;

/// Pages whose listing blocks until released, to hold a rebuild open.
#[derive(Clone)]
struct GatedPages {
    inner: MemoryContentProvider,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl ContentProvider for GatedPages {
    async fn published_page(&self, id: i64) -> Result<Option<ContentPage>, PageError> {
        self.inner.published_page(id).await
    }

    async fn published_pages_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, ContentPage>, PageError> {
        self.inner.published_pages_by_ids(ids).await
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<PageSummary>, PageError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.list_published(limit).await
    }

    async fn count_published(&self) -> Result<i64, PageError> {
        self.inner.count_published().await
    }
}

fn summary(id: i64, slug: &str) -> PageSummary {
    PageSummary { id, title: slug.to_owned(), slug: slug.to_owned() }
}

fn menu_item(page_id: i64, custom_route: &str) -> MenuItem {
    MenuItem {
        page_id,
        title: "Item".into(),
        icon: String::new(),
        order: 0,
        custom_route: custom_route.to_owned(),
        children: Vec::new(),
    }
}

#[test]
fn default_table_serves_home_and_dashboard() {
    let table = RouteTable::default();
    assert_eq!(table.portal_route(), "portal");
    assert_eq!(table.resolve("/portal"), Some(RouteTarget::Home));
    assert_eq!(table.resolve("/portal/"), Some(RouteTarget::Home));
    assert_eq!(table.resolve("/portal/dashboard"), Some(RouteTarget::Dashboard));
    assert_eq!(table.resolve("/portal/dashboard?tab=1"), Some(RouteTarget::Dashboard));
}

#[test]
fn unrelated_paths_do_not_resolve() {
    let table = RouteTable::default();
    assert_eq!(table.resolve("/"), None);
    assert_eq!(table.resolve("/blog/dashboard"), None);
    assert_eq!(table.resolve("/portal/unknown"), None);
    assert_eq!(table.resolve("/portal/dashboard/extra"), None);
}

#[test]
fn page_slugs_resolve_to_pages() {
    let table = RouteTable::build(&Settings::default(), &[], &[summary(7, "billing")]);
    assert_eq!(table.resolve("/portal/billing"), Some(RouteTarget::Page { page_id: 7 }));
}

#[test]
fn custom_routes_need_the_toggle() {
    let menu = [menu_item(5, "team")];
    let off = RouteTable::build(&Settings::default(), &menu, &[]);
    assert_eq!(off.resolve("/portal/team"), None);

    let settings = Settings { enable_custom_urls: true, ..Settings::default() };
    let on = RouteTable::build(&settings, &menu, &[]);
    assert_eq!(on.resolve("/portal/team"), Some(RouteTarget::Page { page_id: 5 }));
}

#[test]
fn precedence_dashboard_then_custom_then_slug() {
    let settings = Settings { enable_custom_urls: true, ..Settings::default() };
    let menu = [menu_item(5, "dashboard"), menu_item(6, "about")];
    let pages = [summary(8, "about"), summary(9, "dashboard")];
    let table = RouteTable::build(&settings, &menu, &pages);
    assert_eq!(table.resolve("/portal/dashboard"), Some(RouteTarget::Dashboard));
    assert_eq!(table.resolve("/portal/about"), Some(RouteTarget::Page { page_id: 6 }));
}

#[test]
fn target_serializes_with_tag() {
    assert_eq!(serde_json::to_value(RouteTarget::Home).unwrap(), json!({"target": "home"}));
    assert_eq!(
        serde_json::to_value(RouteTarget::Page { page_id: 3 }).unwrap(),
        json!({"target": "page", "page_id": 3})
    );
}

#[tokio::test]
async fn refresh_starts_pending_and_runs_once() {
    let options = MemoryOptionStore::new();
    let pages = MemoryContentProvider::new();
    let refresh = RouteRefresh::new();
    assert!(refresh.is_pending());
    assert!(refresh.refresh_if_pending(&options, &pages).await.unwrap());
    assert!(!refresh.refresh_if_pending(&options, &pages).await.unwrap());
}

#[tokio::test]
async fn rapid_schedules_coalesce_into_one_rebuild() {
    let options = MemoryOptionStore::new();
    let pages = MemoryContentProvider::new();
    let refresh = RouteRefresh::new();
    refresh.refresh_if_pending(&options, &pages).await.unwrap();

    for _ in 0..5 {
        refresh.schedule();
    }
    assert!(refresh.refresh_if_pending(&options, &pages).await.unwrap());
    assert!(!refresh.refresh_if_pending(&options, &pages).await.unwrap());
}

#[tokio::test]
async fn table_is_stale_until_refresh() {
    let options = MemoryOptionStore::new();
    let pages = MemoryContentProvider::new();
    let refresh = RouteRefresh::new();
    refresh.refresh_if_pending(&options, &pages).await.unwrap();

    settings::save_settings(&options, &refresh, &json!({"portal_route": "hub"}))
        .await
        .unwrap();
    assert_eq!(refresh.resolve("/hub").await, None);
    assert_eq!(refresh.resolve("/portal").await, Some(RouteTarget::Home));

    refresh.refresh_if_pending(&options, &pages).await.unwrap();
    assert_eq!(refresh.resolve("/hub").await, Some(RouteTarget::Home));
    assert_eq!(refresh.resolve("/portal").await, None);
}

#[tokio::test]
async fn failed_rebuild_stays_pending_and_keeps_table() {
    let options = MemoryOptionStore::new();
    let pages = MemoryContentProvider::new();
    pages.insert(page(3, "Billing", "")).await;
    let refresh = RouteRefresh::new();
    refresh.refresh_if_pending(&options, &pages).await.unwrap();

    options
        .update_option(crate::services::options::SETTINGS_OPTION, &json!("corrupt"))
        .await
        .unwrap();
    refresh.schedule();
    assert!(refresh.refresh_if_pending(&options, &pages).await.is_err());
    assert!(refresh.is_pending());
    assert_eq!(refresh.resolve("/portal/billing").await, Some(RouteTarget::Page { page_id: 3 }));
}

#[tokio::test]
async fn background_task_applies_pending_refresh() {
    let app = crate::state::test_helpers::test_app().await;
    let handle = spawn_route_refresh_task(app.state.clone(), 5);

    app.options
        .update_option(crate::services::options::SETTINGS_OPTION, &json!({"portal_route": "members"}))
        .await
        .unwrap();
    app.state.routes.schedule();

    let mut resolved = None;
    for _ in 0..100 {
        resolved = app.state.routes.resolve("/members").await;
        if resolved.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();
    assert_eq!(resolved, Some(RouteTarget::Home));
}

#[test]
fn table_len_counts_segment_routes() {
    let table = RouteTable::build(&Settings::default(), &[], &[summary(1, "billing")]);
    assert_eq!(table.len(), 2);
    assert!(!table.is_empty());
}

#[tokio::test]
async fn resolve_during_rebuild_waits_for_new_table() {
    let options = MemoryOptionStore::new();
    options
        .update_option(crate::services::options::SETTINGS_OPTION, &json!({"portal_route": "hub"}))
        .await
        .unwrap();
    let gated = GatedPages {
        inner: MemoryContentProvider::new(),
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let refresh = RouteRefresh::new();

    let rebuild = {
        let (refresh, options, gated) = (refresh.clone(), options.clone(), gated.clone());
        tokio::spawn(async move { refresh.refresh_if_pending(&options, &gated).await })
    };
    gated.entered.notified().await;

    let second = {
        let (refresh, options) = (refresh.clone(), options.clone());
        tokio::spawn(async move {
            let rebuilt = refresh
                .refresh_if_pending(&options, &MemoryContentProvider::new())
                .await
                .unwrap();
            (rebuilt, refresh.resolve("/hub").await)
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!second.is_finished());

    gated.release.notify_one();
    assert!(rebuild.await.unwrap().unwrap());
    assert_eq!(second.await.unwrap(), (false, Some(RouteTarget::Home)));
}
