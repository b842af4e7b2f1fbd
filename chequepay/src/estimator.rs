//! Route selection and fee estimation.

use std::future::Future;

use crate::config::AdaptorConfig;
use crate::effect::{Action, effect};
use crate::error::{AdaptorError, BackendError};
use crate::lightning::{LightningBackend, Route};
use crate::types::NodeId;

/// The route a quote is based on, with the fee the caller will be charged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEstimate {
    /// First route the backend offered.
    pub route: Route,
    /// Route fee plus adaptor fee, in millisatoshi.
    pub routing_fee_msat: u64,
}

/// Returns `route_fee_msat + adaptor_fee_msat`.
///
/// # Errors
///
/// Returns [`AdaptorError::FeeOverflow`] if the sum does not fit in a `u64`.
pub fn routing_fee(route_fee_msat: u64, adaptor_fee_msat: u64) -> Result<u64, AdaptorError> {
    route_fee_msat
        .checked_add(adaptor_fee_msat)
        .ok_or(AdaptorError::FeeOverflow {
            route_fee_msat,
            adaptor_fee_msat,
        })
}

/// A node answers a route query it cannot satisfy, such as "unable to find a
/// path to destination", with an error status rather than an empty list.
async fn refused_as_empty(
    query: impl Future<Output = Result<Vec<Route>, BackendError>>,
) -> Result<Vec<Route>, BackendError> {
    match query.await {
        Err(error @ BackendError::Status { .. }) => {
            #[cfg(feature = "telemetry")]
            tracing::info!(cause = ?error, "backend found no route");
            drop(error);
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Queries routes to `destination` and prices the first one.
///
/// # Errors
///
/// Returns [`AdaptorError::NoRouteAvailable`] if the backend offers no route
/// or the first route carries no fee total, [`AdaptorError::FeeOverflow`]
/// from [`routing_fee`], or a relabelled backend failure.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(skip_all, err, fields(destination = %destination, amount_msat = amount_msat))
)]
pub async fn estimate<B>(
    backend: &B,
    destination: &NodeId,
    amount_msat: u64,
    config: &AdaptorConfig,
) -> Result<RouteEstimate, AdaptorError>
where
    B: LightningBackend + ?Sized,
{
    let routes = effect(
        Action::QueryRoutes,
        refused_as_empty(backend.query_routes(destination, amount_msat)),
    )
    .await?;
    let Some((route, route_fee_msat)) = routes
        .into_iter()
        .next()
        .and_then(|route| route.total_fees_msat.map(|fee| (route, fee)))
    else {
        return Err(AdaptorError::NoRouteAvailable {
            recipient: destination.to_string(),
        });
    };
    let routing_fee_msat = routing_fee(route_fee_msat, config.adaptor_fee_msat)?;
    Ok(RouteEstimate {
        route,
        routing_fee_msat,
    })
}
