use serde::{Deserialize, Serialize};

use crate::token::{Scheme, SessionToken};

/// Header used to carry the session token when none is configured.
///
/// Clients and servers agree on this name out of band, so it never changes
/// between releases.
pub const DEFAULT_TOKEN_HEADER_NAME: &str = "X-ErmesSessionToken";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routing client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Header carrying the token on requests and responses.
    #[serde(default = "d_token_header_name")]
    pub token_header_name: String,
    /// Where the first request goes.
    #[serde(default)]
    pub initial: InitialTarget,
}

/// The single source the initial routing target is resolved from.
///
/// ```toml
/// [client.initial]
/// kind = "token"
/// scheme = "http"
/// token = { host = "svc1.internal", sessionId = "abc" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialTarget {
    /// Resume an existing session.
    Token {
        token: SessionToken,
        #[serde(default)]
        scheme: Scheme,
    },
    /// Start unbound against an explicit origin such as `https://a.example`.
    Origin { origin: String },
    /// Start unbound against whatever origin the runtime environment reports.
    #[default]
    Environment,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token_header_name: d_token_header_name(),
            initial: InitialTarget::Environment,
        }
    }
}

impl ClientConfig {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            initial: InitialTarget::Origin {
                origin: origin.into(),
            },
            ..Self::default()
        }
    }

    pub fn with_token(token: SessionToken, scheme: Scheme) -> Self {
        Self {
            initial: InitialTarget::Token { token, scheme },
            ..Self::default()
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_token_header_name() -> String {
    DEFAULT_TOKEN_HEADER_NAME.into()
}
