//! Tunables for the quote and pay pipelines.

use serde::{Deserialize, Serialize};

/// Adaptor fee added to every quote, in millisatoshi.
pub const DEFAULT_ADAPTOR_FEE_MSAT: u64 = 42;
/// Fixed routing fee limit passed to the backend on payment, in satoshi.
pub const DEFAULT_PAY_FEE_LIMIT_SAT: u64 = 42;
/// CLTV delta for the final hop of a payment.
pub const DEFAULT_FINAL_CLTV_DELTA: u32 = 100;
/// Average seconds between blocks, used to turn a time lock into a duration.
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 600;

/// Pipeline configuration.
///
/// Every field has a default, so an empty `[adaptor]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Fee the adaptor adds to the route fee in a quote.
    pub adaptor_fee_msat: u64,
    /// Fixed fee limit for payments. Independent of the quoted fee.
    pub pay_fee_limit_sat: u64,
    /// CLTV delta for the final hop.
    pub final_cltv_delta: u32,
    /// A cheque is refused if it times out within this many milliseconds.
    pub cheque_timeout_margin_ms: u64,
    /// Average block interval used for timeout estimates.
    pub block_time_secs: u64,
    /// Refuse payments larger than the cheque amount, read as millisatoshi.
    /// Turn off for channels denominated in another unit.
    pub enforce_cheque_amount: bool,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            adaptor_fee_msat: DEFAULT_ADAPTOR_FEE_MSAT,
            pay_fee_limit_sat: DEFAULT_PAY_FEE_LIMIT_SAT,
            final_cltv_delta: DEFAULT_FINAL_CLTV_DELTA,
            cheque_timeout_margin_ms: 0,
            block_time_secs: DEFAULT_BLOCK_TIME_SECS,
            enforce_cheque_amount: true,
        }
    }
}
