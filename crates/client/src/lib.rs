//! `ermes-client` — client-side session affinity.
//!
//! A [`SessionRoutingClient`] sends requests to a logical service. When the
//! service answers with a session token bound to a specific backend host,
//! every later request goes straight to that host with the token attached,
//! until the server hands out a different one.
//!
//! # Routing flow
//!
//! ```text
//!   build ──► Unresolved { host }            (explicit origin / environment)
//!         └─► Bound { token }                (explicit token)
//!
//!   dispatch(path):
//!     url     = scheme://{token.host | host}{path}
//!     headers = caller headers + X-ErmesSessionToken: {"host":..,"sessionId":..}
//!     send with credentials included
//!     2xx + token header ──► Bound { new token }   (from either state)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use ermes_client::{ClientBuilder, RequestOptions};
//!
//! # async fn example() -> ermes_domain::Result<()> {
//! let client = ClientBuilder::new().origin("https://api.example.com").build()?;
//!
//! // First call lands on the public origin; the server binds a session.
//! client.dispatch("/login", RequestOptions::post(r#"{"user":"ada"}"#)).await?;
//!
//! // Subsequent calls go to the bound backend host.
//! let resp = client.get("/profile").await?;
//! println!("{}", resp.text());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod origin;
pub mod rest;
pub mod routing;
pub mod transport;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::ClientBuilder;
pub use client::SessionRoutingClient;
pub use origin::{parse_origin, EnvVarOrigin, NoOrigin, OriginProvider, StaticOrigin};
pub use rest::{from_reqwest, ReqwestTransport};
pub use routing::RoutingTarget;
pub use transport::{CredentialPolicy, RequestOptions, Response, Transport, TransportRequest};

// Re-export domain types so callers rarely need ermes-domain directly.
pub use ermes_domain::{
    ClientConfig, Config, Error, HttpConfig, InitialTarget, Origin, Result, Scheme, SessionToken,
    DEFAULT_TOKEN_HEADER_NAME,
};
