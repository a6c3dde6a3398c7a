use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wire representation of a `CircuitBreaker`'s state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

todoat_core::simple_display! {
    CircuitState {
        Closed => "closed",
        Open => "open",
        HalfOpen => "half-open",
    }
}

/// Per-backend fields of a `status` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendStatus {
    pub sync_count: u64,
    pub error_count: u64,
    /// RFC3339Nano timestamp of the last completed sync, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub circuit_state: CircuitState,
}

/// The full `status` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub pid: u32,
    pub started_at: String,
    pub interval_sec: u64,
    pub sync_count: u64,
    pub backends: BTreeMap<String, BackendStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_state_serializes_to_kebab_case_tokens() {
        assert_eq!(serde_json::to_string(&CircuitState::Closed).unwrap(), "\"closed\"");
        assert_eq!(serde_json::to_string(&CircuitState::Open).unwrap(), "\"open\"");
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"half-open\"");
    }

    #[test]
    fn circuit_state_display_matches_serde_token() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "half-open");
    }

    #[test]
    fn status_snapshot_round_trips() {
        let mut backends = BTreeMap::new();
        backends.insert(
            "sqlite".to_string(),
            BackendStatus {
                sync_count: 4,
                error_count: 0,
                last_sync: Some("2026-08-01T00:00:00.000000000Z".into()),
                last_error: None,
                circuit_state: CircuitState::Closed,
            },
        );
        let snapshot = StatusSnapshot {
            running: true,
            pid: 1234,
            started_at: "2026-08-01T00:00:00.000000000Z".into(),
            interval_sec: 300,
            sync_count: 4,
            backends,
        };

        let encoded = serde_json::to_string(&snapshot).expect("encode");
        let decoded: StatusSnapshot = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, snapshot);
    }
}
