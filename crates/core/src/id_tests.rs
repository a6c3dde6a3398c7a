use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_new_has_prefix_and_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_new_generates_unique_ids() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn define_id_from_string_roundtrips() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.as_str(), "tst-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn define_id_hash_map_lookup_by_str() {
    let id = TestId::from_string("tst-lookup");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-lookup"), Some(&42));
}

#[test]
fn define_id_short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn define_id_is_empty() {
    assert!(TestId::from_string("").is_empty());
    assert!(!TestId::new().is_empty());
}

#[test]
fn define_id_display_matches_as_str() {
    let id = TestId::from_string("tst-disp");
    assert_eq!(id.to_string(), "tst-disp");
}

#[test]
fn define_id_equality_against_str() {
    let id = TestId::from_string("tst-eq");
    assert_eq!(id, "tst-eq");
    assert_eq!(id, "tst-eq".to_string().as_str());
}

// --- short() free function tests ---

#[test]
fn short_fn_truncates() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
