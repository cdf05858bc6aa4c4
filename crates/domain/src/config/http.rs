use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout. Per-request overrides take precedence.
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    #[serde(default = "d_10000")]
    pub connect_timeout_ms: u64,
    #[serde(default = "d_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: d_30000(),
            connect_timeout_ms: d_10000(),
            user_agent: d_user_agent(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_30000() -> u64 {
    30_000
}
fn d_10000() -> u64 {
    10_000
}
fn d_user_agent() -> String {
    concat!("ermes-client/", env!("CARGO_PKG_VERSION")).into()
}
