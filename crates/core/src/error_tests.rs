use super::*;

#[yare::parameterized(
    not_found = { Error::NotFound("list".into()), "not_found" },
    unsupported = { Error::Unsupported("restore".into()), "unsupported" },
    conflict = { Error::Conflict("summary".into()), "conflict" },
    unauthorized = { Error::Unauthorized, "unauthorized" },
    offline = { Error::Offline("dns".into()), "offline" },
    invalid_input = { Error::InvalidInput("priority".into()), "invalid_input" },
    timeout = { Error::Timeout, "timeout" },
    circuit_open = { Error::CircuitOpen, "circuit_open" },
    internal = { Error::Internal("boom".into()), "internal" },
)]
fn kind_is_stable_per_variant(err: Error, kind: &str) {
    assert_eq!(err.kind(), kind);
}

#[test]
fn offline_and_unauthorized_carry_suggestions() {
    assert!(Error::Offline("refused".into()).suggestion().is_some());
    assert!(Error::Unauthorized.suggestion().is_some());
}

#[test]
fn not_found_has_no_suggestion() {
    assert_eq!(Error::NotFound("task".into()).suggestion(), None);
}

#[test]
fn display_messages_include_context() {
    let err = Error::NotFound("list".into());
    assert_eq!(err.to_string(), "list not found");

    let err = Error::Conflict("due_date".into());
    assert_eq!(err.to_string(), "conflicting modification to due_date");
}
