//! `ermes-domain` — shared types for the Ermes session-affinity client.
//!
//! Holds the wire-level [`token::SessionToken`], configuration, the shared
//! [`error::Error`], and structured [`trace::TraceEvent`]s.

pub mod config;
pub mod error;
pub mod token;
pub mod trace;

pub use config::{ClientConfig, Config, HttpConfig, InitialTarget, DEFAULT_TOKEN_HEADER_NAME};
pub use error::{Error, Result};
pub use token::{Origin, Scheme, SessionToken};
