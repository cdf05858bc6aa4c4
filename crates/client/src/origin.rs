//! Origin resolution: parsing explicit origins and asking the runtime
//! environment for a default one.

use ermes_domain::error::{Error, Result};
use ermes_domain::{Origin, Scheme};
use reqwest::Url;

/// Environment variable read by [`EnvVarOrigin::default`].
pub const DEFAULT_ORIGIN_ENV: &str = "ERMES_ORIGIN";

/// Supplies a default origin when the client is configured to infer one.
///
/// Consulted once, at construction, and only when no explicit origin or
/// token was given.
pub trait OriginProvider: Send + Sync {
    fn current_origin(&self) -> Option<Origin>;
}

/// An environment with no notion of a current origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrigin;

impl OriginProvider for NoOrigin {
    fn current_origin(&self) -> Option<Origin> {
        None
    }
}

/// A fixed origin, e.g. the page origin handed over by an embedding host.
#[derive(Debug, Clone)]
pub struct StaticOrigin(pub Origin);

impl OriginProvider for StaticOrigin {
    fn current_origin(&self) -> Option<Origin> {
        Some(self.0.clone())
    }
}

/// Reads an origin URL from an environment variable.
///
/// Unset, empty, or unparsable values count as "no origin"; the variable is
/// read each time the provider is asked.
#[derive(Debug, Clone)]
pub struct EnvVarOrigin {
    var: String,
}

impl EnvVarOrigin {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvVarOrigin {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN_ENV)
    }
}

impl OriginProvider for EnvVarOrigin {
    fn current_origin(&self) -> Option<Origin> {
        let raw = std::env::var(&self.var).ok()?;
        if raw.trim().is_empty() {
            return None;
        }
        match parse_origin(raw.trim()) {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!(var = %self.var, error = %e, "ignoring unparsable origin");
                None
            }
        }
    }
}

/// Parse an origin such as `https://a.example` or `http://[::1]:8080`.
///
/// The result keeps only scheme and authority. Anything that would be
/// silently dropped (a path, query, fragment, or credentials) is an
/// [`Error::Config`] instead, as is a scheme other than http/https.
pub fn parse_origin(raw: &str) -> Result<Origin> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid origin {raw:?}: {e}")))?;

    let scheme = Scheme::parse(url.scheme()).ok_or_else(|| {
        Error::Config(format!(
            "origin {raw:?} has unsupported scheme {:?}",
            url.scheme()
        ))
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(format!("origin {raw:?} has no host")))?;

    if !url.username().is_empty() || url.password().is_some() {
        return Err(Error::Config(format!(
            "origin {raw:?} must not carry credentials"
        )));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "origin {raw:?} must not carry a path, query, or fragment"
        )));
    }

    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Origin::new(scheme, authority).map_err(|e| Error::Config(e.to_string()))
}
