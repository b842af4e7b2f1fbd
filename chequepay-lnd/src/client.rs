//! A [`LightningBackend`] that talks to LND over its REST gateway.
//!
//! ## Error Handling
//!
//! Request failures are reported as [`BackendError`]:
//! - connection and body read failures are [`BackendError::Transport`]
//! - non-2xx answers are [`BackendError::Status`] with the body as text
//! - undecodable 2xx bodies are [`BackendError::Decode`]
//! - a payment answered with a non-empty `payment_error` is
//!   [`BackendError::Rejected`]

use std::fmt::Display;
use std::time::Duration;

use chequepay::BackendError;
use chequepay::lightning::{
    DecodedPayReq, LightningBackend, NodeInfo, PaymentResult, Route, SendPayment,
};
use chequepay::types::NodeId;
use http::{HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::error::LndClientError;
use crate::macaroon::Macaroon;
use crate::wire::{QueryRoutesResponse, SendPaymentBody, SendPaymentOutcome};

/// Header LND reads the hex macaroon from.
pub const MACAROON_HEADER: HeaderName = HeaderName::from_static("grpc-metadata-macaroon");

/// How the client checks the node's TLS certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsTrust {
    /// Use the platform's root certificates.
    System,
    /// Trust exactly this PEM certificate, usually LND's `tls.cert`.
    Certificate(Vec<u8>),
    /// Accept any certificate. Only for nodes on a trusted network.
    AcceptInvalid,
}

/// A client for the REST gateway of an LND node.
#[derive(Clone, Debug)]
pub struct LndClient {
    /// Base URL of the gateway (e.g. `https://localhost:8080/`)
    base_url: Url,
    /// Full URL to `GET /v1/getinfo`
    getinfo_url: Url,
    /// Full URL to `POST /v1/channels/transactions`
    send_payment_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Hex macaroon, marked sensitive
    macaroon: HeaderValue,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl LndClient {
    /// Timeout the adaptor uses when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Constructs a new [`LndClient`].
    ///
    /// # Errors
    ///
    /// Returns [`LndClientError`] if the URL cannot be extended, the
    /// certificate does not parse or the HTTP client cannot be built.
    pub fn try_new(
        base_url: Url,
        macaroon: &Macaroon,
        tls: &TlsTrust,
    ) -> Result<Self, LndClientError> {
        if base_url.cannot_be_a_base() {
            return Err(LndClientError::NotABase(base_url));
        }
        let getinfo_url = base_url
            .join("./v1/getinfo")
            .map_err(|source| LndClientError::UrlParse {
                context: "Failed to construct ./v1/getinfo URL",
                source,
            })?;
        let send_payment_url = base_url.join("./v1/channels/transactions").map_err(|source| {
            LndClientError::UrlParse {
                context: "Failed to construct ./v1/channels/transactions URL",
                source,
            }
        })?;

        let mut builder = Client::builder().tcp_keepalive(Duration::from_secs(30));
        builder = match tls {
            TlsTrust::System => builder,
            TlsTrust::Certificate(pem) => {
                let certificate = reqwest::Certificate::from_pem(pem).map_err(|source| {
                    LndClientError::Http {
                        context: "Failed to parse PEM certificate",
                        source,
                    }
                })?;
                builder.add_root_certificate(certificate)
            }
            TlsTrust::AcceptInvalid => builder.danger_accept_invalid_certs(true),
        };
        let client = builder.build().map_err(|source| LndClientError::Http {
            context: "Failed to build HTTP client",
            source,
        })?;

        Ok(Self {
            base_url,
            getinfo_url,
            send_payment_url,
            client,
            macaroon: macaroon.header_value()?,
            timeout: Some(Self::DEFAULT_TIMEOUT),
        })
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET /v1/payreq/{payment_request}`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "lnd.decode_payment_request", skip_all, err, fields(otel.status_code))
    )]
    pub async fn decode_pay_req(&self, payment_request: &str) -> Result<DecodedPayReq, BackendError> {
        let url = self.endpoint(&["v1", "payreq", payment_request]);
        self.send_json(self.client.get(url), "GET /v1/payreq").await
    }

    /// `GET /v1/graph/routes/{pubkey}/0?amt_msat={amount_msat}`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "lnd.query_routes", skip_all, err, fields(otel.status_code))
    )]
    pub async fn query_routes(
        &self,
        destination: &NodeId,
        amount_msat: u64,
    ) -> Result<Vec<Route>, BackendError> {
        let destination = destination.to_string();
        let mut url = self.endpoint(&["v1", "graph", "routes", &destination, "0"]);
        url.query_pairs_mut()
            .append_pair("amt_msat", &amount_msat.to_string());
        let response: QueryRoutesResponse = self
            .send_json(self.client.get(url), "GET /v1/graph/routes")
            .await?;
        Ok(response.routes)
    }

    /// `GET /v1/getinfo`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "lnd.getinfo", skip_all, err, fields(otel.status_code))
    )]
    pub async fn get_info(&self) -> Result<NodeInfo, BackendError> {
        self.send_json(self.client.get(self.getinfo_url.clone()), "GET /v1/getinfo")
            .await
    }

    /// `POST /v1/channels/transactions`
    ///
    /// A 200 answer with a non-empty `payment_error` is reported as
    /// [`BackendError::Rejected`] carrying the full body.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or LND reports a payment error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "lnd.send_payment", skip_all, err, fields(otel.status_code))
    )]
    pub async fn send_payment(&self, request: &SendPayment) -> Result<PaymentResult, BackendError> {
        const CONTEXT: &str = "POST /v1/channels/transactions";
        let body = SendPaymentBody::from(request);
        let value: serde_json::Value = self
            .send_json(
                self.client.post(self.send_payment_url.clone()).json(&body),
                CONTEXT,
            )
            .await?;
        let outcome: SendPaymentOutcome =
            serde_json::from_value(value.clone()).map_err(|e| BackendError::Decode {
                context: CONTEXT,
                message: e.to_string(),
            })?;
        if !outcome.payment_error.is_empty() {
            return Err(BackendError::Rejected {
                context: CONTEXT,
                message: outcome.payment_error,
                body: value,
            });
        }
        Ok(PaymentResult(value))
    }

    /// Generic request helper that handles authentication, error mapping,
    /// timeout application, and telemetry integration.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages (e.g. `"GET /v1/getinfo"`).
    async fn send_json<R>(
        &self,
        request: RequestBuilder,
        context: &'static str,
    ) -> Result<R, BackendError>
    where
        R: DeserializeOwned,
    {
        let mut request = request.header(MACAROON_HEADER, self.macaroon.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let http_response = request
            .send()
            .await
            .map_err(|e| BackendError::transport(context, e))?;

        let status = http_response.status();
        let result = if status.is_success() {
            let bytes = http_response
                .bytes()
                .await
                .map_err(|e| BackendError::transport(context, e))?;
            serde_json::from_slice::<R>(&bytes).map_err(|e| BackendError::Decode {
                context,
                message: e.to_string(),
            })
        } else {
            let body = http_response
                .text()
                .await
                .map_err(|e| BackendError::transport(context, e))?;
            Err(BackendError::Status {
                context,
                status: status.as_u16(),
                body,
            })
        };

        record_result_on_span(&result);

        result
    }
}

#[async_trait::async_trait]
impl LightningBackend for LndClient {
    async fn decode_payment_request(
        &self,
        payment_request: &str,
    ) -> Result<DecodedPayReq, BackendError> {
        self.decode_pay_req(payment_request).await
    }

    async fn query_routes(
        &self,
        destination: &NodeId,
        amount_msat: u64,
    ) -> Result<Vec<Route>, BackendError> {
        Self::query_routes(self, destination, amount_msat).await
    }

    async fn node_info(&self) -> Result<NodeInfo, BackendError> {
        self.get_info().await
    }

    async fn send_payment(&self, request: &SendPayment) -> Result<PaymentResult, BackendError> {
        Self::send_payment(self, request).await
    }
}

/// Converts a string URL into an [`LndClient`] that trusts system roots.
impl TryFrom<(&str, &Macaroon)> for LndClient {
    type Error = LndClientError;

    fn try_from((value, macaroon): (&str, &Macaroon)) -> Result<Self, Self::Error> {
        let url = normalize_base_url(value)?;
        Self::try_new(url, macaroon, &TlsTrust::System)
    }
}

/// Parses a base URL, forcing exactly one trailing slash so relative joins
/// land under it.
///
/// # Errors
///
/// Returns [`LndClientError::UrlParse`] if the value is not a URL.
pub fn normalize_base_url(value: &str) -> Result<Url, LndClientError> {
    let mut normalized = value.trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized).map_err(|source| LndClientError::UrlParse {
        context: "Failed to parse base url",
        source,
    })
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to LND failed");
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
