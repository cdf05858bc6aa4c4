mod client;
mod http;

pub use client::*;
pub use http::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::token::Scheme;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("parsing config: {e}")))
    }

    /// Read and parse the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Checks that need
    /// the HTTP stack (header-name syntax, origin parsing) happen when the
    /// client is built.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.client.token_header_name.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "client.token_header_name".into(),
                message: "token header name must not be empty".into(),
            });
        }

        match &self.client.initial {
            InitialTarget::Token { token, scheme } => {
                if let Err(e) = token.validate() {
                    issues.push(ConfigIssue {
                        severity: ConfigSeverity::Error,
                        field: "client.initial.token.host".into(),
                        message: e.to_string(),
                    });
                }
                // The token is sent in clear text on every request.
                if *scheme == Scheme::Http {
                    issues.push(ConfigIssue {
                        severity: ConfigSeverity::Warning,
                        field: "client.initial.scheme".into(),
                        message: "session token will be sent over plain http".into(),
                    });
                }
            }
            InitialTarget::Origin { origin } => {
                if origin.trim().is_empty() {
                    issues.push(ConfigIssue {
                        severity: ConfigSeverity::Error,
                        field: "client.initial.origin".into(),
                        message: "origin must not be empty".into(),
                    });
                }
            }
            InitialTarget::Environment => {}
        }

        if self.http.timeout_ms == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "http.timeout_ms".into(),
                message: "timeout must be greater than 0".into(),
            });
        }
        if self.http.connect_timeout_ms == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "http.connect_timeout_ms".into(),
                message: "connect timeout must be greater than 0".into(),
            });
        }

        issues
    }
}
