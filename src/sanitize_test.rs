use super::*;
use serde_json::json;

// =============================================================================
// strip_tags / text
// =============================================================================

#[test]
fn strip_tags_removes_markup() {
    assert_eq!(strip_tags("<b>Hello</b> world"), "Hello world");
}

#[test]
fn strip_tags_keeps_unmatched_bracket() {
    assert_eq!(strip_tags("a < b"), "a < b");
}

#[test]
fn text_collapses_whitespace() {
    assert_eq!(text("  My \n\t Portal  "), "My Portal");
}

#[test]
fn text_is_idempotent() {
    let once = text(" <i>Mails</i>   left ");
    assert_eq!(text(&once), once);
}

// =============================================================================
// slugify
// =============================================================================

#[test]
fn slugify_portal_route_scenario() {
    assert_eq!(slugify("my portal!"), "my-portal");
}

#[test]
fn slugify_lowercases_and_joins() {
    assert_eq!(slugify("Client_Area / Home"), "client-area-home");
}

#[test]
fn slugify_trims_edge_separators() {
    assert_eq!(slugify("--portal--"), "portal");
    assert_eq!(slugify("/portal/"), "portal");
}

#[test]
fn slugify_drops_special_characters() {
    assert_eq!(slugify("p@rt#l$"), "prtl");
}

#[test]
fn slugify_empty_input() {
    assert_eq!(slugify("  !!  "), "");
}

#[test]
fn slugify_is_idempotent() {
    for raw in ["my portal!", "A  B__C", "<em>x</em> y", "already-a-slug"] {
        let once = slugify(raw);
        assert_eq!(slugify(&once), once, "input {raw:?}");
    }
}

// =============================================================================
// key / hex_color / url
// =============================================================================

#[test]
fn key_filters_to_identifier_chars() {
    assert_eq!(key("Chart Pie!"), "chartpie");
    assert_eq!(key("custom-svg_1"), "custom-svg_1");
}

#[test]
fn hex_color_accepts_short_and_long() {
    assert_eq!(hex_color("#FFF").as_deref(), Some("#fff"));
    assert_eq!(hex_color(" #2271B1 ").as_deref(), Some("#2271b1"));
}

#[test]
fn hex_color_rejects_malformed() {
    assert!(hex_color("2271b1").is_none());
    assert!(hex_color("#12345").is_none());
    assert!(hex_color("#gggggg").is_none());
    assert!(hex_color("red").is_none());
}

#[test]
fn url_accepts_http_and_relative() {
    assert_eq!(url("https://cdn.test/icon.svg").as_deref(), Some("https://cdn.test/icon.svg"));
    assert_eq!(url("/uploads/icon.svg").as_deref(), Some("/uploads/icon.svg"));
}

#[test]
fn url_rejects_scripts_and_protocol_relative() {
    assert!(url("javascript:alert(1)").is_none());
    assert!(url("//evil.test/x.svg").is_none());
    assert!(url("https://a.test/x y.svg").is_none());
    assert!(url("").is_none());
}

// =============================================================================
// truthy / field readers
// =============================================================================

#[test]
fn truthy_coerces_form_values() {
    assert_eq!(truthy(&json!(true)), Some(true));
    assert_eq!(truthy(&json!(0)), Some(false));
    assert_eq!(truthy(&json!("yes")), Some(true));
    assert_eq!(truthy(&json!("off")), Some(false));
    assert_eq!(truthy(&json!("maybe")), None);
    assert_eq!(truthy(&json!(null)), None);
}

#[test]
fn int_field_reads_numbers_and_strings() {
    let obj = json!({"a": 7, "b": "12", "c": 3.9, "d": "x", "e": null});
    let map = obj.as_object().unwrap();
    assert_eq!(int_field(map, "a"), Some(7));
    assert_eq!(int_field(map, "b"), Some(12));
    assert_eq!(int_field(map, "c"), Some(3));
    assert_eq!(int_field(map, "d"), None);
    assert_eq!(int_field(map, "e"), None);
    assert_eq!(int_field(map, "missing"), None);
}

#[test]
fn string_field_renders_numbers() {
    let obj = json!({"n": 42, "s": "hi", "b": true});
    let map = obj.as_object().unwrap();
    assert_eq!(string_field(map, "n").as_deref(), Some("42"));
    assert_eq!(string_field(map, "s").as_deref(), Some("hi"));
    assert!(string_field(map, "b").is_none());
}
