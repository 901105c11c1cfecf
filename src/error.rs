use std::sync::Arc;

use thiserror::Error;

/// Result type used by fallible SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may occur while setting up the client, fetching settings, or talking to host
/// plugins.
///
/// Decision operations (`activate`, `track`, ...) never return errors. A user that cannot be
/// bucketed gets `None`/`false` instead.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Settings document could not be parsed.
    #[error("error parsing account settings")]
    SettingsParseError(#[source] Arc<serde_json::Error>),

    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The settings request was rejected, the SDK key is likely invalid.
    #[error("unauthorized, sdk_key is likely invalid")]
    Unauthorized,

    /// Server responded with a status the SDK does not know how to handle.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(u16),

    /// Fault reported by a user storage plugin.
    #[error("user storage error: {0}")]
    Storage(String),

    /// The event dispatcher thread panicked. This should normally never happen.
    #[error("event dispatcher thread panicked")]
    DispatcherThreadPanicked,

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::SettingsParseError(Arc::new(value))
    }
}
