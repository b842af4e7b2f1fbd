//! The Lightning backend seam.
//!
//! [`LightningBackend`] is the only way the pipelines talk to a Lightning
//! node. The response types mirror what a node's REST gateway returns; the
//! request type is expressed in adaptor terms and mapped onto the wire by
//! each implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::error::BackendError;
use crate::types::{Lock, NodeId, PaymentAddr};

/// A payment request as decoded by the backend, before validation.
///
/// Numeric fields stay strings here; [`crate::invoice::Invoice`] parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedPayReq {
    /// Hex public key of the recipient node.
    pub destination: String,
    /// Hex payment hash.
    pub payment_hash: String,
    /// Amount in millisatoshi.
    pub num_msat: String,
    /// Creation time, Unix seconds.
    pub timestamp: String,
    /// Validity window, seconds after `timestamp`.
    pub expiry: String,
}

/// One candidate route to a recipient.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Fees charged along the route. `None` marks a placeholder route with
    /// nothing to price.
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    pub total_fees_msat: Option<u64>,
    /// Amount delivered plus fees.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    pub total_amt_msat: u64,
    /// Absolute block height at which the first HTLC times out.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub total_time_lock: u64,
}

/// Backend node information.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Current chain tip as seen by the node.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub block_height: u64,
}

/// A payment to make.
///
/// The hash is a cheque [`Lock`]; an invoice's own payment hash has a
/// different type and cannot be placed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPayment {
    /// Recipient node.
    pub destination: NodeId,
    /// Hash the payment is locked to.
    pub payment_hash: Lock,
    /// Amount to deliver in millisatoshi.
    pub amount_msat: u64,
    /// Maximum routing fee in satoshi.
    pub fee_limit_sat: u64,
    /// CLTV delta for the final hop.
    pub final_cltv_delta: u32,
    /// Payment secret from the invoice, if the caller supplied one.
    pub payment_addr: Option<PaymentAddr>,
}

/// The backend's answer to a successful payment, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentResult(pub serde_json::Value);

/// Operations the adaptor needs from a Lightning node.
#[async_trait::async_trait]
pub trait LightningBackend: Send + Sync {
    /// Decodes a BOLT11 payment request.
    async fn decode_payment_request(
        &self,
        payment_request: &str,
    ) -> Result<DecodedPayReq, BackendError>;

    /// Returns candidate routes to `destination` for `amount_msat`, best first.
    async fn query_routes(
        &self,
        destination: &NodeId,
        amount_msat: u64,
    ) -> Result<Vec<Route>, BackendError>;

    /// Returns node information.
    async fn node_info(&self) -> Result<NodeInfo, BackendError>;

    /// Sends a payment.
    async fn send_payment(&self, request: &SendPayment) -> Result<PaymentResult, BackendError>;
}

#[async_trait::async_trait]
impl<T: LightningBackend + ?Sized> LightningBackend for Arc<T> {
    async fn decode_payment_request(
        &self,
        payment_request: &str,
    ) -> Result<DecodedPayReq, BackendError> {
        (**self).decode_payment_request(payment_request).await
    }

    async fn query_routes(
        &self,
        destination: &NodeId,
        amount_msat: u64,
    ) -> Result<Vec<Route>, BackendError> {
        (**self).query_routes(destination, amount_msat).await
    }

    async fn node_info(&self) -> Result<NodeInfo, BackendError> {
        (**self).node_info().await
    }

    async fn send_payment(&self, request: &SendPayment) -> Result<PaymentResult, BackendError> {
        (**self).send_payment(request).await
    }
}
