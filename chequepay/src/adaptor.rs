//! The adaptor facade the HTTP layer drives.

use crate::config::AdaptorConfig;
use crate::error::AdaptorError;
use crate::ledger::{InMemoryLedger, RedemptionLedger};
use crate::lightning::{LightningBackend, PaymentResult};
use crate::pay::{self, PayRequest};
use crate::quote::{self, Quote};
use crate::timestamp::now_millis;

/// A Lightning backend, a redemption ledger and the pipeline configuration.
#[derive(Debug)]
pub struct Adaptor<B, L = InMemoryLedger> {
    backend: B,
    ledger: L,
    config: AdaptorConfig,
}

impl<B: LightningBackend> Adaptor<B> {
    /// Creates an adaptor with an empty in-memory ledger.
    pub fn new(backend: B, config: AdaptorConfig) -> Self {
        Self::with_ledger(backend, InMemoryLedger::new(), config)
    }
}

impl<B: LightningBackend, L: RedemptionLedger> Adaptor<B, L> {
    /// Creates an adaptor backed by `ledger`.
    pub const fn with_ledger(backend: B, ledger: L, config: AdaptorConfig) -> Self {
        Self {
            backend,
            ledger,
            config,
        }
    }

    /// Returns the pipeline configuration.
    pub const fn config(&self) -> &AdaptorConfig {
        &self.config
    }

    /// Quotes the cost of paying `payment_request`.
    ///
    /// # Errors
    ///
    /// See [`quote::quote`].
    pub async fn quote(&self, payment_request: &str) -> Result<Quote, AdaptorError> {
        quote::quote(&self.backend, payment_request, &self.config).await
    }

    /// Redeems a cheque against the current wall clock.
    ///
    /// # Errors
    ///
    /// See [`pay::pay`].
    pub async fn pay(&self, request: &PayRequest) -> Result<PaymentResult, AdaptorError> {
        self.pay_at(request, now_millis()).await
    }

    /// Redeems a cheque as of `now_ms`.
    ///
    /// # Errors
    ///
    /// See [`pay::pay`].
    pub async fn pay_at(
        &self,
        request: &PayRequest,
        now_ms: u64,
    ) -> Result<PaymentResult, AdaptorError> {
        pay::pay(&self.backend, &self.ledger, request, now_ms, &self.config).await
    }
}
