//! The boundary around every Lightning backend call.
//!
//! [`effect`] runs a single backend operation and relabels any failure into
//! the [`AdaptorError`] taxonomy. There is no retry here: a payment that
//! failed in transit may still have gone through.

use std::fmt;
use std::future::Future;

use crate::error::{AdaptorError, BackendError};

/// The backend operations the adaptor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Decode a BOLT11 payment request.
    DecodePaymentRequest,
    /// Look up routes to a node.
    QueryRoutes,
    /// Read node info such as the current block height.
    FetchNodeInfo,
    /// Send a payment.
    SendPayment,
}

impl Action {
    /// Short human-readable title, used in `failed to {title}` messages.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::DecodePaymentRequest => "decode payment request",
            Self::QueryRoutes => "query routes",
            Self::FetchNodeInfo => "fetch node info",
            Self::SendPayment => "send payment",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Runs `operation`, relabelling a failure according to `action`.
///
/// # Errors
///
/// Returns the relabelled error from [`escalate`] when the operation fails.
pub async fn effect<T, F>(action: Action, operation: F) -> Result<T, AdaptorError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(source) => {
            let error = escalate(action, source);
            #[cfg(feature = "telemetry")]
            tracing::error!(
                action = %action,
                kind = %error.kind(),
                cause = %crate::error::error_chain(&error),
                "lightning backend call failed"
            );
            Err(error)
        }
    }
}

/// Maps a backend failure onto the adaptor taxonomy.
///
/// - transport failures are always [`AdaptorError::BackendUnavailable`]
/// - a refused decode is [`AdaptorError::InvoiceDecodeFailed`]
/// - a refused or failed payment is [`AdaptorError::PaymentFailed`]
/// - a refused route query never gets here; the estimator reads it as an
///   empty route list
/// - everything else, including an undecodable response to a payment,
///   is [`AdaptorError::InternalEffectFailure`]
#[must_use]
pub fn escalate(action: Action, source: BackendError) -> AdaptorError {
    match (action, &source) {
        (_, BackendError::Transport { .. }) => AdaptorError::BackendUnavailable { action, source },
        (
            Action::DecodePaymentRequest,
            BackendError::Status { .. } | BackendError::Rejected { .. },
        ) => AdaptorError::InvoiceDecodeFailed { action, source },
        (Action::SendPayment, BackendError::Status { .. } | BackendError::Rejected { .. }) => {
            AdaptorError::PaymentFailed { action, source }
        }
        _ => AdaptorError::InternalEffectFailure { action, source },
    }
}
