//! The quote pipeline: invoice in, priced offer out.

use serde::Serialize;

use crate::config::AdaptorConfig;
use crate::effect::{Action, effect};
use crate::error::AdaptorError;
use crate::estimator::{RouteEstimate, estimate};
use crate::invoice::{Invoice, decode_invoice};
use crate::lightning::LightningBackend;
use crate::types::{NodeId, PaymentHash};

/// What the adaptor will charge to pay an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Invoice amount in millisatoshi.
    pub amount: u64,
    /// Invoice recipient.
    pub recipient: NodeId,
    /// Invoice payment hash.
    pub payment_hash: PaymentHash,
    /// Route fee plus adaptor fee in millisatoshi.
    pub routing_fee: u64,
    /// Invoice expiry, RFC 3339 UTC with milliseconds.
    pub expiry: String,
    /// Rough time until the route's HTLCs would time out.
    pub estimated_timeout_secs: u64,
}

/// Combines a decoded invoice and a priced route into a quote.
///
/// # Errors
///
/// Returns [`AdaptorError::MalformedInvoice`] if the invoice expiry cannot be
/// represented.
pub fn assemble_quote(
    invoice: &Invoice,
    estimate: &RouteEstimate,
    block_height: u64,
    config: &AdaptorConfig,
) -> Result<Quote, AdaptorError> {
    let expiry = invoice
        .expires_at()?
        .to_rfc3339()
        .ok_or_else(|| AdaptorError::MalformedInvoice("expiry out of range".into()))?;
    let blocks = estimate.route.total_time_lock.saturating_sub(block_height);
    Ok(Quote {
        amount: invoice.amount_msat,
        recipient: invoice.destination,
        payment_hash: invoice.payment_hash,
        routing_fee: estimate.routing_fee_msat,
        expiry,
        estimated_timeout_secs: blocks.saturating_mul(config.block_time_secs),
    })
}

/// Decodes `payment_request`, finds a route and prices it.
///
/// # Errors
///
/// Any error from [`decode_invoice`], [`estimate`] or [`assemble_quote`], or a
/// relabelled failure reading the node's block height.
#[cfg_attr(feature = "telemetry", tracing::instrument(skip_all, err))]
pub async fn quote<B>(
    backend: &B,
    payment_request: &str,
    config: &AdaptorConfig,
) -> Result<Quote, AdaptorError>
where
    B: LightningBackend + ?Sized,
{
    let invoice = decode_invoice(backend, payment_request).await?;
    let estimate = estimate(backend, &invoice.destination, invoice.amount_msat, config).await?;
    let info = effect(Action::FetchNodeInfo, backend.node_info()).await?;
    let quote = assemble_quote(&invoice, &estimate, info.block_height, config)?;

    #[cfg(feature = "telemetry")]
    tracing::info!(
        recipient = %quote.recipient,
        amount = quote.amount,
        routing_fee = quote.routing_fee,
        "quote issued"
    );

    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lightning::Route;
    use crate::mock::{DESTINATION, MockBackend};

    #[tokio::test]
    async fn test_quote_scenario() {
        let backend = MockBackend::default();
        let quote = quote(&backend, "lnbc1...", &AdaptorConfig::default())
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&quote).unwrap(),
            serde_json::json!({
                "amount": 100_000,
                "recipient": DESTINATION,
                "payment_hash": "cd".repeat(32),
                "routing_fee": 1050,
                "expiry": "2023-11-14T23:13:20.000Z",
                "estimated_timeout_secs": 144 * 600,
            })
        );
    }

    #[tokio::test]
    async fn test_fixed_adaptor_fee_on_cheap_route() {
        let mut backend = MockBackend::default();
        backend.decoded.payment_hash = "ff".repeat(32);
        backend.routes = vec![Route {
            total_fees_msat: Some(50),
            ..Route::default()
        }];
        let config = AdaptorConfig {
            adaptor_fee_msat: 42_000,
            ..AdaptorConfig::default()
        };

        let quote = quote(&backend, "lnbc1...", &config).await.unwrap();
        assert_eq!(quote.amount, 100_000);
        assert_eq!(quote.recipient.to_string(), DESTINATION);
        assert_eq!(quote.payment_hash.to_string(), "ff".repeat(32));
        assert_eq!(quote.routing_fee, 42_050);
        assert_eq!(quote.expiry, "2023-11-14T23:13:20.000Z");
    }

    #[tokio::test]
    async fn test_unparseable_amount_stops_before_routing() {
        let mut backend = MockBackend::default();
        backend.decoded.num_msat = "abc".into();
        let err = quote(&backend, "lnbc1...", &AdaptorConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInvoice);
        assert_eq!(
            backend.route_calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[test]
    fn test_assemble_is_sum_of_fees() {
        let invoice = Invoice::try_from(MockBackend::default().decoded).unwrap();
        let config = AdaptorConfig {
            adaptor_fee_msat: 8,
            ..AdaptorConfig::default()
        };
        let estimate = RouteEstimate {
            route: Route {
                total_fees_msat: Some(2),
                total_amt_msat: 0,
                total_time_lock: 10,
            },
            routing_fee_msat: 10,
        };
        let quote = assemble_quote(&invoice, &estimate, 20, &config).unwrap();
        assert_eq!(quote.routing_fee, 10);
        assert_eq!(quote.estimated_timeout_secs, 0);
    }
}
