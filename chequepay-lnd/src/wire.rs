//! JSON bodies of the LND REST gateway.

use chequepay::lightning::{Route, SendPayment};
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::{DisplayFromStr, serde_as};

/// `GET /v1/graph/routes/...` response.
#[derive(Debug, Deserialize)]
pub struct QueryRoutesResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// `fee_limit` of a send request, in satoshi.
#[serde_as]
#[derive(Debug, Serialize)]
pub struct FeeLimit {
    #[serde_as(as = "DisplayFromStr")]
    pub fixed: u64,
}

/// `POST /v1/channels/transactions` request.
///
/// Byte fields are base64 and 64-bit integers are strings, as the gateway
/// expects.
#[serde_as]
#[derive(Debug, Serialize)]
pub struct SendPaymentBody {
    #[serde_as(as = "Base64")]
    pub dest: [u8; 33],
    #[serde_as(as = "Base64")]
    pub payment_hash: [u8; 32],
    #[serde_as(as = "DisplayFromStr")]
    pub amt_msat: u64,
    pub final_cltv_delta: u32,
    pub fee_limit: FeeLimit,
    #[serde_as(as = "Option<Base64>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_addr: Option<[u8; 32]>,
}

impl From<&SendPayment> for SendPaymentBody {
    fn from(request: &SendPayment) -> Self {
        Self {
            dest: *request.destination.as_bytes(),
            payment_hash: *request.payment_hash.as_bytes(),
            amt_msat: request.amount_msat,
            final_cltv_delta: request.final_cltv_delta,
            fee_limit: FeeLimit {
                fixed: request.fee_limit_sat,
            },
            payment_addr: request.payment_addr.map(|addr| *addr.as_bytes()),
        }
    }
}

/// The part of a send response that tells success from failure.
#[derive(Debug, Deserialize)]
pub struct SendPaymentOutcome {
    #[serde(default)]
    pub payment_error: String,
}
