//! Payment execution.

use crate::config::AdaptorConfig;
use crate::effect::{Action, effect};
use crate::error::AdaptorError;
use crate::lightning::{LightningBackend, PaymentResult, SendPayment};
use crate::types::{Lock, NodeId, PaymentAddr};

/// Where a payment goes, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTarget {
    /// Recipient node.
    pub destination: NodeId,
    /// Amount to deliver in millisatoshi.
    pub amount_msat: u64,
    /// Payment secret from the invoice.
    pub payment_addr: Option<PaymentAddr>,
}

/// Builds the backend request for `target`, locked to `lock`.
///
/// The fee limit and final CLTV delta come from `config`, never from a quote.
#[must_use]
pub const fn payment_request(
    target: &PaymentTarget,
    lock: Lock,
    config: &AdaptorConfig,
) -> SendPayment {
    SendPayment {
        destination: target.destination,
        payment_hash: lock,
        amount_msat: target.amount_msat,
        fee_limit_sat: config.pay_fee_limit_sat,
        final_cltv_delta: config.final_cltv_delta,
        payment_addr: target.payment_addr,
    }
}

/// Sends a payment for `target` locked to the cheque's `lock`.
///
/// # Errors
///
/// Returns a relabelled backend failure; see [`crate::effect::escalate`].
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(skip_all, err, fields(destination = %target.destination, lock = %lock))
)]
pub async fn pay<B>(
    backend: &B,
    target: &PaymentTarget,
    lock: Lock,
    config: &AdaptorConfig,
) -> Result<PaymentResult, AdaptorError>
where
    B: LightningBackend + ?Sized,
{
    let request = payment_request(target, lock, config);
    effect(Action::SendPayment, backend.send_payment(&request)).await
}
