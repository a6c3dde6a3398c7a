use serde::{Deserialize, Serialize};

/// A request sent by the CLI over the daemon's control socket.
///
/// Unknown top-level keys are ignored by serde's default behavior; an
/// unknown `type` tag decodes to [`Request::Unknown`] so the daemon can
/// answer with the documented `unknown method` error instead of closing
/// the connection on a forward-compatible client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Enqueue a coalesced sync pass.
    Notify,
    /// Read-only snapshot of daemon state.
    Status,
    /// Initiate graceful shutdown.
    Stop,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_round_trips_through_json() {
        let encoded = serde_json::to_string(&Request::Notify).expect("encode");
        assert_eq!(encoded, r#"{"type":"notify"}"#);
        let decoded: Request = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, Request::Notify);
    }

    #[test]
    fn unrecognized_type_decodes_as_unknown() {
        let decoded: Request = serde_json::from_str(r#"{"type":"reticulate_splines"}"#).expect("decode");
        assert_eq!(decoded, Request::Unknown);
    }

    #[test]
    fn unknown_extra_keys_are_ignored() {
        let decoded: Request =
            serde_json::from_str(r#"{"type":"status","future_field":42}"#).expect("decode");
        assert_eq!(decoded, Request::Status);
    }
}
