//! The routing target: where the next request goes.

use ermes_domain::SessionToken;

/// Either a bare host with no session yet, or a session bound to
/// `token.host`.
///
/// Transitions only ever go towards `Bound`: `Unresolved → Bound` when the
/// first token arrives, `Bound → Bound` when the server rotates or migrates
/// the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingTarget {
    Unresolved { host: String },
    Bound { token: SessionToken },
}

impl RoutingTarget {
    /// The authority requests are sent to.
    pub fn authority(&self) -> &str {
        match self {
            RoutingTarget::Unresolved { host } => host,
            RoutingTarget::Bound { token } => token.host(),
        }
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            RoutingTarget::Unresolved { .. } => None,
            RoutingTarget::Bound { token } => Some(token),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, RoutingTarget::Bound { .. })
    }
}
