//! Session tokens and the authorities they bind a client to.
//!
//! A [`SessionToken`] travels as JSON in a single header, in both
//! directions:
//!
//! ```text
//! X-ErmesSessionToken: {"host":"svc1.internal","sessionId":"abc"}
//! ```
//!
//! Fields other than `host` and `sessionId` are opaque to the client; they
//! are kept and echoed back exactly as the server sent them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheme
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Parse a URL scheme. Only `http` and `https` are routable.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Host validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Check that `host` is a bare authority (`name[:port]`).
///
/// Malformed hosts are rejected, never repaired: a trailing `/` or a
/// `scheme://` prefix would produce a different URL than the server
/// intended.
pub fn validate_host(host: &str) -> std::result::Result<(), String> {
    if host.is_empty() {
        return Err("host must not be empty".into());
    }
    if host.contains("://") {
        return Err(format!("host {host:?} must not contain a scheme prefix"));
    }
    if host.ends_with('/') {
        return Err(format!("host {host:?} must not end with a path separator"));
    }
    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!("host {host:?} must not contain whitespace"));
    }
    Ok(())
}

/// Bytes allowed in an HTTP field value: visible ASCII, space, tab, and
/// obs-text (0x80..=0xff).
fn is_header_value_byte(b: u8) -> bool {
    b == b'\t' || (b >= 0x20 && b != 0x7f)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SessionToken
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A session bound to a specific backend host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    host: String,
    session_id: String,
    /// Server-supplied fields the client does not interpret.
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionToken {
    /// Build a token from user input, failing with [`Error::Validation`]
    /// when the host is malformed or the token could not be sent as a
    /// header value.
    pub fn new(host: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let token = Self {
            host: host.into(),
            session_id: session_id.into(),
            extra: serde_json::Map::new(),
        };
        token.validate()?;
        Ok(token)
    }

    /// Decode a token from its header value.
    ///
    /// Anything that is not a JSON object with string `host` and
    /// `sessionId` fields, whose host is malformed, or that could not be
    /// sent back as a header value, is an [`Error::TokenDecode`].
    pub fn from_header_value(raw: &str) -> Result<Self> {
        let token: SessionToken = serde_json::from_str(raw)
            .map_err(|e| Error::TokenDecode(format!("invalid token payload: {e}")))?;
        token.check().map_err(Error::TokenDecode)?;
        Ok(token)
    }

    /// Encode the token as a header value.
    pub fn to_header_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Re-check the token invariants: a well-formed host, and an encoding
    /// that is a legal header value. Tokens deserialized from configuration
    /// bypass [`SessionToken::new`], so construction paths call this.
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(Error::Validation)
    }

    fn check(&self) -> std::result::Result<(), String> {
        validate_host(&self.host)?;
        let encoded = serde_json::to_string(self).map_err(|e| e.to_string())?;
        // serde_json escapes C0 controls but writes DEL raw, which no
        // header value may carry.
        if let Some(b) = encoded.bytes().find(|&b| !is_header_value_byte(b)) {
            return Err(format!(
                "token cannot be sent as a header value (byte 0x{b:02x})"
            ));
        }
        Ok(())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Fields the server attached beyond `host` and `sessionId`.
    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Origin
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A scheme plus bare authority, e.g. `https` + `a.example:8443`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: Scheme,
    host: String,
}

impl Origin {
    pub fn new(scheme: Scheme, host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        validate_host(&host).map_err(Error::Validation)?;
        Ok(Self { scheme, host })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}
