//! `reqwest` implementation of [`Transport`].
//!
//! `ReqwestTransport` keeps two connection pools: one sharing a cookie jar
//! for requests that carry credentials, one without cookies for
//! [`CredentialPolicy::Omit`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ermes_domain::config::HttpConfig;
use ermes_domain::error::{Error, Result};
use reqwest::cookie::Jar;
use reqwest::Client;

use crate::transport::{CredentialPolicy, Response, Transport, TransportRequest};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Network transport backed by `reqwest`.
///
/// Created once and reused; both inner clients maintain connection pools.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    with_credentials: Client,
    anonymous: Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Build a transport from the shared `HttpConfig`.
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let connect_timeout = Duration::from_millis(cfg.connect_timeout_ms);

        let with_credentials = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(&cfg.user_agent)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let anonymous = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(&cfg.user_agent)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            with_credentials,
            anonymous,
            jar,
        })
    }

    /// The cookie jar shared by credentialed requests.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    fn client_for(&self, policy: CredentialPolicy) -> &Client {
        match policy {
            // The jar scopes cookies by domain, which is as close to
            // same-origin as a non-browser client gets.
            CredentialPolicy::Include | CredentialPolicy::SameOrigin => &self.with_credentials,
            CredentialPolicy::Omit => &self.anonymous,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: TransportRequest) -> Result<Response> {
        let start = Instant::now();
        let mut rb = self
            .client_for(req.credentials)
            .request(req.method.clone(), &req.url)
            .headers(req.headers);
        if let Some(body) = req.body {
            rb = rb.body(body);
        }
        if let Some(timeout) = req.timeout {
            rb = rb.timeout(timeout);
        }

        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(from_reqwest)?.to_vec();

        tracing::debug!(
            method = %req.method,
            url = %req.url,
            status = status.as_u16(),
            bytes = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "transport round-trip"
        );

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
