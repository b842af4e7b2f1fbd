//! A scripted [`LightningBackend`] that counts its calls.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::BackendError;
use crate::lightning::{DecodedPayReq, LightningBackend, NodeInfo, PaymentResult, Route, SendPayment};
use crate::types::NodeId;

pub(crate) const DESTINATION: &str =
    "02abababababababababababababababababababababababababababababababab";

pub(crate) enum Outcome {
    Paid(serde_json::Value),
    Status(u16, &'static str),
    Refused,
}

pub(crate) struct MockBackend {
    pub decoded: DecodedPayReq,
    pub routes: Vec<Route>,
    pub route_status: Option<(u16, &'static str)>,
    pub block_height: u64,
    pub outcome: Outcome,
    pub decode_calls: AtomicUsize,
    pub route_calls: AtomicUsize,
    pub payment_calls: AtomicUsize,
    pub last_payment: Mutex<Option<SendPayment>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            decoded: DecodedPayReq {
                destination: DESTINATION.into(),
                payment_hash: "cd".repeat(32),
                num_msat: "100000".into(),
                timestamp: "1700000000".into(),
                expiry: "3600".into(),
            },
            routes: vec![Route {
                total_fees_msat: Some(1008),
                total_amt_msat: 101_008,
                total_time_lock: 800_144,
            }],
            route_status: None,
            block_height: 800_000,
            outcome: Outcome::Paid(serde_json::json!({ "payment_preimage": "AAAA" })),
            decode_calls: AtomicUsize::new(0),
            route_calls: AtomicUsize::new(0),
            payment_calls: AtomicUsize::new(0),
            last_payment: Mutex::new(None),
        }
    }
}

impl MockBackend {
    pub fn payments(&self) -> usize {
        self.payment_calls.load(Ordering::SeqCst)
    }

    pub fn last_payment(&self) -> Option<SendPayment> {
        self.last_payment.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LightningBackend for MockBackend {
    async fn decode_payment_request(&self, _: &str) -> Result<DecodedPayReq, BackendError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decoded.clone())
    }

    async fn query_routes(&self, _: &NodeId, _: u64) -> Result<Vec<Route>, BackendError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        match self.route_status {
            Some((status, body)) => Err(BackendError::Status {
                context: "query routes",
                status,
                body: body.to_owned(),
            }),
            None => Ok(self.routes.clone()),
        }
    }

    async fn node_info(&self) -> Result<NodeInfo, BackendError> {
        Ok(NodeInfo {
            block_height: self.block_height,
        })
    }

    async fn send_payment(&self, request: &SendPayment) -> Result<PaymentResult, BackendError> {
        self.payment_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payment.lock().unwrap() = Some(request.clone());
        match &self.outcome {
            Outcome::Paid(value) => Ok(PaymentResult(value.clone())),
            Outcome::Status(status, body) => Err(BackendError::Status {
                context: "send payment",
                status: *status,
                body: (*body).to_owned(),
            }),
            Outcome::Refused => Err(BackendError::transport(
                "send payment",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            )),
        }
    }
}
