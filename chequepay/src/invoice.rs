//! Invoice decoding.

use crate::effect::{Action, effect};
use crate::error::AdaptorError;
use crate::lightning::{DecodedPayReq, LightningBackend};
use crate::timestamp::UnixTimestamp;
use crate::types::{NodeId, PaymentHash};

/// A validated Lightning invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invoice {
    /// Recipient node.
    pub destination: NodeId,
    /// Payment hash the invoice is locked to.
    pub payment_hash: PaymentHash,
    /// Requested amount in millisatoshi.
    pub amount_msat: u64,
    /// Creation time.
    pub timestamp: UnixTimestamp,
    /// Seconds after `timestamp` the invoice stays payable.
    pub expiry_secs: u64,
}

impl Invoice {
    /// Returns the instant the invoice stops being payable.
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::MalformedInvoice`] if `timestamp + expiry`
    /// overflows.
    pub fn expires_at(&self) -> Result<UnixTimestamp, AdaptorError> {
        self.timestamp
            .checked_add_secs(self.expiry_secs)
            .ok_or_else(|| AdaptorError::MalformedInvoice("expiry overflows".into()))
    }
}

impl TryFrom<DecodedPayReq> for Invoice {
    type Error = AdaptorError;

    fn try_from(decoded: DecodedPayReq) -> Result<Self, Self::Error> {
        let destination = decoded
            .destination
            .parse()
            .map_err(|e| AdaptorError::MalformedInvoice(format!("destination: {e}")))?;
        let payment_hash = decoded
            .payment_hash
            .parse()
            .map_err(|e| AdaptorError::MalformedInvoice(format!("payment_hash: {e}")))?;
        Ok(Self {
            destination,
            payment_hash,
            amount_msat: integer("num_msat", &decoded.num_msat)?,
            timestamp: UnixTimestamp::from_secs(integer("timestamp", &decoded.timestamp)?),
            expiry_secs: integer("expiry", &decoded.expiry)?,
        })
    }
}

fn integer(field: &str, value: &str) -> Result<u64, AdaptorError> {
    value.parse().map_err(|_| {
        AdaptorError::MalformedInvoice(format!("{field} is not an integer: {value:?}"))
    })
}

/// Asks the backend to decode `payment_request` and validates the result.
///
/// # Errors
///
/// Returns a relabelled backend failure from [`effect`], or
/// [`AdaptorError::MalformedInvoice`] if the decoded fields do not parse.
#[cfg_attr(feature = "telemetry", tracing::instrument(skip_all, err))]
pub async fn decode_invoice<B>(backend: &B, payment_request: &str) -> Result<Invoice, AdaptorError>
where
    B: LightningBackend + ?Sized,
{
    let decoded = effect(
        Action::DecodePaymentRequest,
        backend.decode_payment_request(payment_request),
    )
    .await?;
    Invoice::try_from(decoded)
}
