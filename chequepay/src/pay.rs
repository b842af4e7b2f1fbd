//! The pay pipeline: signed cheque in, Lightning payment out.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. request fields parse (key, tag, destination, payment address)
//! 2. the cheque frame is well formed
//! 3. the signature verifies over `tag ‖ body`
//! 4. the body decodes
//! 5. the cheque has not timed out
//! 6. the payment is no larger than the cheque amount, unless
//!    [`AdaptorConfig::enforce_cheque_amount`] is off
//! 7. the index is claimed in the ledger
//!
//! Only then is the payment sent, with the cheque's lock as payment hash.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::cheque::{ChequeBody, ChequeFrame};
use crate::config::AdaptorConfig;
use crate::error::AdaptorError;
use crate::executor::{self, PaymentTarget};
use crate::ledger::{ChannelKey, RedemptionLedger};
use crate::lightning::{LightningBackend, PaymentResult};
use crate::types::{PaymentAddr, Tag, VerificationKey};
use crate::verify::verify_cheque;

/// Body of a pay request.
///
/// Field names are camelCase on the wire. `msat` may be a JSON number or a
/// decimal string.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    /// Hex channel tag.
    pub tag: String,
    /// Hex Ed25519 public key.
    pub verification_key: String,
    /// Hex payment secret of the invoice being paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_addr: Option<String>,
    /// Hex cheque frame.
    pub cheque: String,
    /// Hex recipient node key.
    pub dest: String,
    /// Amount to deliver in millisatoshi.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub msat: u64,
}

/// A [`PayRequest`] with every hex field parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayRequest {
    /// Channel the cheque belongs to.
    pub channel: ChannelKey,
    /// Payment destination and amount.
    pub target: PaymentTarget,
    /// Cheque frame.
    pub frame: ChequeFrame,
}

impl PayRequest {
    /// Parses every field.
    ///
    /// # Errors
    ///
    /// - [`AdaptorError::InvalidKeyMaterial`] if the key is not 32 bytes of hex
    /// - [`AdaptorError::InvalidRequest`] for a bad tag, destination or payment address
    /// - [`AdaptorError::MalformedCheque`] for a bad cheque frame
    pub fn parse(&self) -> Result<ParsedPayRequest, AdaptorError> {
        let verification_key: VerificationKey = self
            .verification_key
            .parse()
            .map_err(|e| AdaptorError::InvalidKeyMaterial(format!("verification key: {e}")))?;
        let tag: Tag = self
            .tag
            .parse()
            .map_err(|e| AdaptorError::InvalidRequest(format!("tag: {e}")))?;
        let destination = self
            .dest
            .parse()
            .map_err(|e| AdaptorError::InvalidRequest(format!("dest: {e}")))?;
        let payment_addr = self
            .payment_addr
            .as_deref()
            .map(str::parse::<PaymentAddr>)
            .transpose()
            .map_err(|e| AdaptorError::InvalidRequest(format!("paymentAddr: {e}")))?;
        let frame = ChequeFrame::from_hex(&self.cheque)?;
        Ok(ParsedPayRequest {
            channel: ChannelKey {
                verification_key,
                tag,
            },
            target: PaymentTarget {
                destination,
                amount_msat: self.msat,
                payment_addr,
            },
            frame,
        })
    }
}

/// Checks that a cheque is still redeemable at `now_ms`.
///
/// # Errors
///
/// Returns [`AdaptorError::ChequeExpired`] once `now_ms + margin` reaches the
/// cheque timeout.
pub const fn check_timeout(
    body: &ChequeBody,
    now_ms: u64,
    margin_ms: u64,
) -> Result<(), AdaptorError> {
    if now_ms.saturating_add(margin_ms) >= body.timeout_ms {
        return Err(AdaptorError::ChequeExpired {
            timeout_ms: body.timeout_ms,
            now_ms,
        });
    }
    Ok(())
}

/// Checks that the payment fits within the cheque.
///
/// # Errors
///
/// Returns [`AdaptorError::AmountExceedsCheque`] if `requested_msat` is larger
/// than the cheque amount.
pub const fn check_amount(body: &ChequeBody, requested_msat: u64) -> Result<(), AdaptorError> {
    if requested_msat > body.amount {
        return Err(AdaptorError::AmountExceedsCheque {
            requested_msat,
            cheque_amount: body.amount,
        });
    }
    Ok(())
}

/// Runs the pay pipeline for `request` as of `now_ms`.
///
/// # Errors
///
/// The first failing check, in the order listed in the module docs, or the
/// relabelled payment failure.
#[cfg_attr(feature = "telemetry", tracing::instrument(skip_all, err))]
pub async fn pay<B, L>(
    backend: &B,
    ledger: &L,
    request: &PayRequest,
    now_ms: u64,
    config: &AdaptorConfig,
) -> Result<PaymentResult, AdaptorError>
where
    B: LightningBackend + ?Sized,
    L: RedemptionLedger + ?Sized,
{
    let ParsedPayRequest {
        channel,
        target,
        frame,
    } = request.parse()?;

    if let Err(error) = verify_cheque(&frame, &channel.tag, &channel.verification_key) {
        #[cfg(feature = "telemetry")]
        tracing::warn!(key = %channel.verification_key, tag = %channel.tag, "cheque signature rejected");
        return Err(error);
    }

    let body = ChequeBody::decode(frame.body())?;
    check_timeout(&body, now_ms, config.cheque_timeout_margin_ms)?;
    if config.enforce_cheque_amount {
        check_amount(&body, target.amount_msat)?;
    }
    ledger.claim(&channel, body.index)?;

    #[cfg(feature = "telemetry")]
    tracing::info!(
        index = body.index,
        amount = body.amount,
        lock = %body.lock,
        destination = %target.destination,
        "redeeming cheque"
    );

    executor::pay(backend, &target, body.lock, config).await
}
