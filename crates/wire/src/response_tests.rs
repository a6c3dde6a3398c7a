use super::*;

#[test]
fn notify_ack_serializes_without_error_field() {
    let response = Response::Notify { ok: true, error: None };
    let json = serde_json::to_value(&response).expect("encode");
    assert_eq!(json["type"], "notify");
    assert!(json.get("error").is_none());
}

#[test]
fn unknown_method_has_stable_wording_and_ok_false() {
    let json = serde_json::to_value(Response::unknown_method()).expect("encode");
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "unknown method");
}

#[test]
fn shutting_down_has_ok_false() {
    let json = serde_json::to_value(Response::shutting_down()).expect("encode");
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "shutting down");
}
