use super::*;
use crate::services::options::MemoryOptionStore;
use crate::services::pages::MemoryContentProvider;
use serde_json::json;

fn item(page_id: i64, title: &str, order: i64) -> MenuItem {
    MenuItem {
        page_id,
        title: title.to_owned(),
        icon: String::new(),
        order,
        custom_route: String::new(),
        children: Vec::new(),
    }
}

#[test]
fn drops_entries_without_page_or_title() {
    let (items, dropped) = sanitize_menu_items(&json!([
        {"page_id": 3, "title": "Billing"},
        {"title": "No page"},
        {"page_id": 0, "title": "Zero page"},
        {"page_id": 4, "title": "   "},
        "not an object",
        {"page_id": "5", "title": "String id"}
    ]))
    .unwrap();
    assert_eq!(dropped, 4);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].page_id, 5);
}

#[test]
fn non_array_payload_is_rejected() {
    let err = sanitize_menu_items(&json!({"page_id": 1})).unwrap_err();
    assert!(matches!(err, MenuError::Validation(_)));
}

#[test]
fn order_defaults_to_position() {
    let (items, _) = sanitize_menu_items(&json!([
        {"page_id": 1, "title": "A"},
        {"page_id": 2, "title": "B", "order": 7},
        {"page_id": 3, "title": "C"}
    ]))
    .unwrap();
    let orders: Vec<i64> = items.iter().map(|i| i.order).collect();
    assert_eq!(orders, vec![0, 7, 2]);
}

#[test]
fn fields_are_sanitized() {
    let (items, _) = sanitize_menu_items(&json!([{
        "page_id": 9,
        "title": "<em>Team</em> Docs",
        "icon": "Custom-Rocket!",
        "custom_route": "Team Docs"
    }]))
    .unwrap();
    let item = &items[0];
    assert_eq!(item.title, "Team Docs");
    assert_eq!(item.icon, "custom-rocket");
    assert_eq!(item.custom_icon_key(), Some("rocket"));
    assert_eq!(item.custom_route, "team-docs");
}

#[test]
fn builtin_icon_has_no_custom_key() {
    let mut it = item(1, "Home", 0);
    it.icon = "dashicons-admin-home".into();
    assert_eq!(it.custom_icon_key(), None);
    it.icon = "custom-".into();
    assert_eq!(it.custom_icon_key(), None);
}

#[test]
fn children_are_one_level_deep() {
    let (items, _) = sanitize_menu_items(&json!([{
        "page_id": 1,
        "title": "Parent",
        "children": [{
            "page_id": 2,
            "title": "Child",
            "children": [{"page_id": 3, "title": "Grandchild"}]
        }]
    }]))
    .unwrap();
    assert_eq!(items[0].children.len(), 1);
    assert!(items[0].children[0].children.is_empty());
}

#[test]
fn render_sort_is_stable_on_ties() {
    let items = vec![item(1, "First", 1), item(2, "Second", 0), item(3, "Third", 1)];
    let titles: Vec<String> = sorted_for_render(&items).into_iter().map(|i| i.title).collect();
    assert_eq!(titles, vec!["Second", "First", "Third"]);
}

#[test]
fn render_sort_orders_children() {
    let mut parent = item(1, "Parent", 0);
    parent.children = vec![item(2, "Late", 5), item(3, "Early", 1)];
    let sorted = sorted_for_render(&[parent]);
    assert_eq!(sorted[0].children[0].title, "Early");
}

#[test]
fn flatten_is_depth_first() {
    let mut a = item(1, "A", 0);
    a.children = vec![item(2, "A1", 0)];
    let b = item(3, "B", 1);
    let ids: Vec<i64> = flatten(&[a, b]).map(|i| i.page_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn save_preserves_submitted_order() {
    let store = MemoryOptionStore::new();
    let refresh = RouteRefresh::new();
    save_menu_items(&store, &refresh, &json!([
        {"page_id": 2, "title": "Two", "order": 5},
        {"page_id": 1, "title": "One", "order": 1}
    ]))
    .await
    .unwrap();
    let loaded = load_menu_items(&store).await.unwrap();
    assert_eq!(loaded[0].page_id, 2);
    assert_eq!(loaded[1].page_id, 1);
}

#[tokio::test]
async fn save_with_empty_list_clears_menu() {
    let store = MemoryOptionStore::new();
    let refresh = RouteRefresh::new();
    save_menu_items(&store, &refresh, &json!([{"page_id": 1, "title": "One"}])).await.unwrap();
    save_menu_items(&store, &refresh, &json!([])).await.unwrap();
    assert!(load_menu_items(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn custom_route_change_schedules_refresh() {
    let store = MemoryOptionStore::new();
    let refresh = RouteRefresh::new();
    refresh
        .refresh_if_pending(&store, &MemoryContentProvider::new())
        .await
        .unwrap();

    save_menu_items(&store, &refresh, &json!([{"page_id": 1, "title": "One"}])).await.unwrap();
    assert!(!refresh.is_pending());

    save_menu_items(&store, &refresh, &json!([{"page_id": 1, "title": "Renamed"}])).await.unwrap();
    assert!(!refresh.is_pending());

    save_menu_items(&store, &refresh, &json!([{"page_id": 1, "title": "One", "custom_route": "one"}]))
        .await
        .unwrap();
    assert!(refresh.is_pending());
}

#[tokio::test]
async fn malformed_stored_menu_is_an_error() {
    let store = MemoryOptionStore::new();
    store.update_option(MENU_ITEMS_OPTION, &json!({"not": "a list"})).await.unwrap();
    assert!(matches!(load_menu_items(&store).await, Err(MenuError::Store(_))));
}
