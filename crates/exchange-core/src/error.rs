//! Error types for the exchange.
//!
//! [`ExchangeError`] covers the failures the routing and view layers can
//! produce. Each variant maps to an HTTP status through
//! [`ExchangeError::status_code`], so handlers can turn any error into a
//! response without matching on it.

use thiserror::Error;

/// The primary error type shared by all exchange crates.
#[derive(Error, Debug)]
pub enum ExchangeError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found. Also used for failed URL resolution and
    /// failed reverse lookups.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The application is wired up incorrectly (bad route, duplicate
    /// route name, view without a lookup kwarg).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExchangeError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest` -> 400
    /// - `NotFound` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::IoError(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, ExchangeError>`.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
