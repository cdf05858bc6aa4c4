use serde::Serialize;

/// Structured trace events emitted across all Ermes crates.
///
/// Session ids are never recorded, only their length.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ClientResolved {
        source: String,
        scheme: String,
        host: String,
        bound: bool,
    },
    RequestDispatched {
        method: String,
        url: String,
        bound: bool,
        status: u16,
        duration_ms: u64,
    },
    SessionBound {
        previous_host: String,
        host: String,
        session_id_len: usize,
    },
    SessionRotated {
        previous_host: String,
        host: String,
        session_id_len: usize,
    },
    TokenRejected {
        url: String,
        status: u16,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        match self {
            TraceEvent::TokenRejected { .. } => {
                tracing::warn!(trace_event = %json, "ermes_event");
            }
            _ => tracing::info!(trace_event = %json, "ermes_event"),
        }
    }
}
