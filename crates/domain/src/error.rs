/// Shared error type used across all Ermes crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No usable origin, or an origin/config file that cannot be used.
    #[error("config: {0}")]
    Config(String),

    /// User-supplied input (token host, header name) is malformed.
    #[error("validation: {0}")]
    Validation(String),

    /// A response carried the token header but its value is not a token.
    #[error("token decode: {0}")]
    TokenDecode(String),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, Error>;
