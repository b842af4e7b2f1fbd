//! HTTP rendering of adaptor errors.
//!
//! Every error response has the body `{"error": "<message>", "kind": "<code>"}`.
//! Only the top-level message is rendered; backend bodies stay in the logs.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chequepay::error::error_chain;
use chequepay::{AdaptorError, ErrorKind};

/// Code rendered for requests that match no route.
pub const NOT_FOUND: &str = "not_found";

/// Code rendered for a known path requested with the wrong method.
pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";

/// Errors returned by the route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A pipeline failed.
    #[error(transparent)]
    Adaptor(#[from] AdaptorError),

    /// The request body is not the expected JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// A path segment could not be extracted.
    #[error("invalid request path: {0}")]
    InvalidPath(#[from] PathRejection),

    /// No route matches the request.
    #[error("no such endpoint: {method} {path}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// The path exists but not for this method.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },
}

impl ApiError {
    /// The adaptor error kind, if the error has one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Adaptor(error) => Some(error.kind()),
            Self::InvalidBody(_) | Self::InvalidPath(_) => Some(ErrorKind::InvalidRequest),
            Self::NotFound { .. } | Self::MethodNotAllowed { .. } => None,
        }
    }

    /// Machine-readable code rendered as `kind`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match (self.kind(), self) {
            (Some(kind), _) => kind.as_str(),
            (None, Self::MethodNotAllowed { .. }) => METHOD_NOT_ALLOWED,
            (None, _) => NOT_FOUND,
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match (self.kind(), self) {
            (Some(kind), _) => status_for(kind),
            (None, Self::MethodNotAllowed { .. }) => StatusCode::METHOD_NOT_ALLOWED,
            (None, _) => StatusCode::NOT_FOUND,
        }
    }
}

/// Maps an error kind onto an HTTP status.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::ChequeReplayed => StatusCode::CONFLICT,
        ErrorKind::ChequeExpired => StatusCode::GONE,
        ErrorKind::BackendUnavailable
        | ErrorKind::InvoiceDecodeFailed
        | ErrorKind::PaymentFailed
        | ErrorKind::InternalEffectFailure => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = code, cause = %error_chain(&self), "request failed");
        } else {
            tracing::info!(kind = code, error = %self, "request rejected");
        }
        let body = serde_json::json!({ "error": self.to_string(), "kind": code });
        (status, axum::Json(body)).into_response()
    }
}
