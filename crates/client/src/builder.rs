//! Builder pattern for constructing a [`SessionRoutingClient`].

use std::sync::Arc;

use ermes_domain::config::{ClientConfig, Config, HttpConfig, InitialTarget};
use ermes_domain::error::{Error, Result};
use ermes_domain::{Scheme, SessionToken};

use crate::client::SessionRoutingClient;
use crate::origin::{EnvVarOrigin, OriginProvider};
use crate::rest::ReqwestTransport;
use crate::transport::Transport;

/// Fluent builder for [`SessionRoutingClient`].
///
/// Each of [`origin`](Self::origin), [`token`](Self::token) and
/// [`from_environment`](Self::from_environment) replaces whatever initial
/// target was set before, so exactly one source is ever active.
///
/// # Example
///
/// ```rust,no_run
/// # use ermes_client::ClientBuilder;
/// # async fn example() -> ermes_domain::Result<()> {
/// let client = ClientBuilder::new()
///     .origin("https://api.example.com")
///     .token_header_name("X-ErmesSessionToken")
///     .build()?;
///
/// let resp = client.get("/sessions/new").await?;
/// println!("{} -> bound to {:?}", resp.status, client.token().map(|t| t.host().to_owned()));
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    pub(crate) client: ClientConfig,
    pub(crate) http: HttpConfig,
    pub(crate) scheme: Option<Scheme>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) origins: Option<Arc<dyn OriginProvider>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            client: ClientConfig::default(),
            http: HttpConfig::default(),
            scheme: None,
            transport: None,
            origins: None,
        }
    }

    /// Start from a loaded [`Config`] (client + HTTP sections).
    pub fn config(mut self, cfg: Config) -> Self {
        self.client = cfg.client;
        self.http = cfg.http;
        self.scheme = None;
        self
    }

    // ── Initial target ───────────────────────────────────────────────

    /// Start unbound against an explicit origin (`https://a.example`).
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.client.initial = InitialTarget::Origin {
            origin: origin.into(),
        };
        self
    }

    /// Resume an existing session.
    pub fn token(mut self, token: SessionToken) -> Self {
        self.client.initial = InitialTarget::Token {
            token,
            scheme: self.scheme.unwrap_or_default(),
        };
        self
    }

    /// Infer the origin from the [`OriginProvider`].
    pub fn from_environment(mut self) -> Self {
        self.client.initial = InitialTarget::Environment;
        self
    }

    /// Scheme used with an explicit token (default `https`).
    ///
    /// Origins carry their own scheme, so building with a scheme and a
    /// non-token target fails.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        if let InitialTarget::Token { scheme: s, .. } = &mut self.client.initial {
            *s = scheme;
        }
        self
    }

    // ── Wire / collaborators ─────────────────────────────────────────

    /// Override the token header name (default `X-ErmesSessionToken`).
    pub fn token_header_name(mut self, name: impl Into<String>) -> Self {
        self.client.token_header_name = name.into();
        self
    }

    /// Override how the default origin is discovered (default: the
    /// `ERMES_ORIGIN` environment variable).
    pub fn origin_provider(mut self, provider: impl OriginProvider + 'static) -> Self {
        self.origins = Some(Arc::new(provider));
        self
    }

    /// Use a custom transport instead of the built-in `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Settings for the built-in transport. Ignored with a custom transport.
    pub fn http_config(mut self, cfg: HttpConfig) -> Self {
        self.http = cfg;
        self
    }

    /// Build the [`SessionRoutingClient`].
    pub fn build(self) -> Result<SessionRoutingClient> {
        if self.scheme.is_some() && !matches!(self.client.initial, InitialTarget::Token { .. }) {
            return Err(Error::Config(
                "scheme only applies to an explicit token; origins carry their own scheme".into(),
            ));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(&self.http)?),
        };
        let origins: Arc<dyn OriginProvider> = match self.origins {
            Some(o) => o,
            None => Arc::new(EnvVarOrigin::default()),
        };

        SessionRoutingClient::new(&self.client, transport, origins.as_ref())
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
