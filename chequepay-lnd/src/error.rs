use std::path::PathBuf;

/// Errors that can occur while setting up an [`LndClient`](crate::LndClient).
///
/// Failures of individual requests are reported as
/// [`chequepay::BackendError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum LndClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot have path segments appended.
    #[error("base url cannot be a base: {0}")]
    NotABase(url::Url),
    /// The macaroon is not valid hex.
    #[error("macaroon is not hex: {0}")]
    MacaroonHex(#[from] hex::FromHexError),
    /// The macaroon is empty.
    #[error("macaroon is empty")]
    MacaroonEmpty,
    /// The macaroon file could not be read.
    #[error("failed to read macaroon from {path}: {source}")]
    MacaroonRead {
        /// File that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The macaroon could not be used as a header value.
    #[error("macaroon is not a valid header value: {0}")]
    MacaroonHeader(#[from] http::header::InvalidHeaderValue),
    /// HTTP client setup error.
    #[error("HTTP client error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}
