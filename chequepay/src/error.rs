//! Error types for the cheque adaptor.
//!
//! [`AdaptorError`] is the single taxonomy every pipeline stage reports in.
//! Failures from the Lightning backend start out as [`BackendError`] and are
//! relabelled at the effect boundary (see [`crate::effect`]) so the original
//! cause stays attached as the error source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::Action;

/// Machine-readable code for each [`AdaptorError`] variant.
///
/// Stable across releases; serialized in `snake_case` on the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request itself carried an unusable field.
    InvalidRequest,
    /// The cheque is not hex or is shorter than the minimum frame.
    MalformedCheque,
    /// The cheque body is not the expected CBOR structure.
    MalformedChequeBody,
    /// A key or signature has the wrong size.
    InvalidKeyMaterial,
    /// The signature does not verify.
    Unauthorized,
    /// The cheque timeout has passed.
    ChequeExpired,
    /// The requested payment is larger than the cheque.
    AmountExceedsCheque,
    /// The cheque index has already been redeemed.
    ChequeReplayed,
    /// The decoded invoice is missing or has non-numeric fields.
    MalformedInvoice,
    /// The backend refused to decode the invoice.
    InvoiceDecodeFailed,
    /// No route to the recipient exists.
    NoRouteAvailable,
    /// Route fee plus adaptor fee does not fit in 64 bits.
    FeeOverflow,
    /// The backend could not be reached.
    BackendUnavailable,
    /// The backend rejected or failed the payment.
    PaymentFailed,
    /// Any other backend failure.
    InternalEffectFailure,
}

impl ErrorKind {
    /// Returns the `snake_case` code for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::MalformedCheque => "malformed_cheque",
            Self::MalformedChequeBody => "malformed_cheque_body",
            Self::InvalidKeyMaterial => "invalid_key_material",
            Self::Unauthorized => "unauthorized",
            Self::ChequeExpired => "cheque_expired",
            Self::AmountExceedsCheque => "amount_exceeds_cheque",
            Self::ChequeReplayed => "cheque_replayed",
            Self::MalformedInvoice => "malformed_invoice",
            Self::InvoiceDecodeFailed => "invoice_decode_failed",
            Self::NoRouteAvailable => "no_route_available",
            Self::FeeOverflow => "fee_overflow",
            Self::BackendUnavailable => "backend_unavailable",
            Self::PaymentFailed => "payment_failed",
            Self::InternalEffectFailure => "internal_effect_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by the quote and pay pipelines.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AdaptorError {
    /// A request field other than the cheque could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The cheque is not hex or is too short to hold a frame.
    #[error("malformed cheque: {0}")]
    MalformedCheque(String),
    /// The cheque body is not a CBOR array of four fields.
    #[error("malformed cheque body: {0}")]
    MalformedChequeBody(String),
    /// A verification key or signature has the wrong size.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
    /// The cheque signature does not match the verification key.
    #[error("cheque signature is not valid for the verification key")]
    Unauthorized,
    /// The cheque timeout (POSIX milliseconds) has passed.
    #[error("cheque expired at {timeout_ms}, now {now_ms}")]
    ChequeExpired {
        /// Timeout carried by the cheque.
        timeout_ms: u64,
        /// Wall clock at the time of the check.
        now_ms: u64,
    },
    /// The requested payment is larger than the cheque amount.
    #[error("payment of {requested_msat} msat exceeds cheque amount {cheque_amount}")]
    AmountExceedsCheque {
        /// Amount the caller asked to pay.
        requested_msat: u64,
        /// Amount carried by the cheque.
        cheque_amount: u64,
    },
    /// The cheque index is not above the highest index redeemed on its channel.
    #[error("cheque index {index} already redeemed, highest redeemed index is {highest}")]
    ChequeReplayed {
        /// Index carried by the cheque.
        index: u64,
        /// Highest index already redeemed on the channel.
        highest: u64,
    },
    /// The decoded invoice has a missing or non-numeric field.
    #[error("malformed invoice: {0}")]
    MalformedInvoice(String),
    /// The backend returned no route to the recipient.
    #[error("no route available to {recipient}")]
    NoRouteAvailable {
        /// Hex-encoded recipient node.
        recipient: String,
    },
    /// Route fee plus adaptor fee overflowed.
    #[error("routing fee overflows: {route_fee_msat} + {adaptor_fee_msat}")]
    FeeOverflow {
        /// Fee of the selected route.
        route_fee_msat: u64,
        /// Fee the adaptor adds on top.
        adaptor_fee_msat: u64,
    },
    /// The backend could not be reached.
    #[error("failed to {action}: lightning backend unavailable")]
    BackendUnavailable {
        /// Backend call that failed.
        action: Action,
        /// Underlying transport failure.
        #[source]
        source: BackendError,
    },
    /// The backend refused to decode the payment request.
    #[error("failed to {action}")]
    InvoiceDecodeFailed {
        /// Backend call that failed.
        action: Action,
        /// Backend response.
        #[source]
        source: BackendError,
    },
    /// The backend rejected or failed the payment.
    #[error("failed to {action}")]
    PaymentFailed {
        /// Backend call that failed.
        action: Action,
        /// Backend response, including its error body.
        #[source]
        source: BackendError,
    },
    /// Any other failure inside a backend call.
    #[error("failed to {action}")]
    InternalEffectFailure {
        /// Backend call that failed.
        action: Action,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
}

impl AdaptorError {
    /// Returns the machine-readable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::MalformedCheque(_) => ErrorKind::MalformedCheque,
            Self::MalformedChequeBody(_) => ErrorKind::MalformedChequeBody,
            Self::InvalidKeyMaterial(_) => ErrorKind::InvalidKeyMaterial,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::ChequeExpired { .. } => ErrorKind::ChequeExpired,
            Self::AmountExceedsCheque { .. } => ErrorKind::AmountExceedsCheque,
            Self::ChequeReplayed { .. } => ErrorKind::ChequeReplayed,
            Self::MalformedInvoice(_) => ErrorKind::MalformedInvoice,
            Self::NoRouteAvailable { .. } => ErrorKind::NoRouteAvailable,
            Self::FeeOverflow { .. } => ErrorKind::FeeOverflow,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::InvoiceDecodeFailed { .. } => ErrorKind::InvoiceDecodeFailed,
            Self::PaymentFailed { .. } => ErrorKind::PaymentFailed,
            Self::InternalEffectFailure { .. } => ErrorKind::InternalEffectFailure,
        }
    }

    /// Returns the backend call this error came from, if any.
    #[must_use]
    pub const fn action(&self) -> Option<Action> {
        match self {
            Self::BackendUnavailable { action, .. }
            | Self::InvoiceDecodeFailed { action, .. }
            | Self::PaymentFailed { action, .. }
            | Self::InternalEffectFailure { action, .. } => Some(*action),
            _ => None,
        }
    }

    /// Returns the backend failure attached to this error, if any.
    #[must_use]
    pub const fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::BackendUnavailable { source, .. }
            | Self::InvoiceDecodeFailed { source, .. }
            | Self::PaymentFailed { source, .. }
            | Self::InternalEffectFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failures reported by a [`LightningBackend`](crate::LightningBackend).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The request never produced a response.
    #[error("transport error: {context}: {source}")]
    Transport {
        /// What was being attempted.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The backend answered with a non-success status.
    #[error("unexpected status {status}: {context}: {body}")]
    Status {
        /// What was being attempted.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body as received.
        body: String,
    },
    /// The response could not be decoded.
    #[error("failed to decode response: {context}: {message}")]
    Decode {
        /// What was being attempted.
        context: &'static str,
        /// Decoder message.
        message: String,
    },
    /// The backend answered successfully but reported a failure in the body.
    #[error("rejected by backend: {context}: {message}")]
    Rejected {
        /// What was being attempted.
        context: &'static str,
        /// Failure reported by the backend.
        message: String,
        /// Full response body.
        body: serde_json::Value,
    },
}

impl BackendError {
    /// Wraps a transport failure.
    pub fn transport(
        context: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context,
            source: Box::new(source),
        }
    }
}

/// Renders an error followed by each of its sources, separated by `: `.
#[must_use]
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
