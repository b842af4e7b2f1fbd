#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! An LND REST implementation of [`chequepay::LightningBackend`].
//!
//! [`LndClient`] talks to the REST gateway of an LND node, authenticating
//! every request with a [`Macaroon`]. The node's self-signed certificate can
//! be pinned with [`TlsTrust::Certificate`].
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | decode payment request | `GET /v1/payreq/{payment_request}` |
//! | query routes | `GET /v1/graph/routes/{pubkey}/0?amt_msat={n}` |
//! | node info | `GET /v1/getinfo` |
//! | send payment | `POST /v1/channels/transactions` |
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing spans around each request

mod client;
mod error;
mod macaroon;
mod wire;

pub use client::{LndClient, MACAROON_HEADER, TlsTrust, normalize_base_url};
pub use error::LndClientError;
pub use macaroon::Macaroon;
