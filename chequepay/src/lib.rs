#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types and pipelines for the chequepay adaptor.
//!
//! The adaptor bridges an off-chain payment-channel voucher ("cheque") to the
//! Lightning Network. A channel consumer asks for a [`Quote`](quote::Quote) on a
//! Lightning invoice, then hands over a signed cheque whose lock is used as the
//! payment hash of the Lightning payment the adaptor makes on its behalf.
//!
//! # Overview
//!
//! ```text
//! quote:  payment request ──decode──► Invoice ──routes──► Route ──► Quote
//! pay:    cheque ──frame──► (tag ‖ body, signature) ──verify──► ChequeBody
//!                ──timeout/index──► SendPayment ──backend──► PaymentResult
//! ```
//!
//! Every call into the Lightning backend goes through the effect boundary in
//! [`effect`], which relabels failures into the [`AdaptorError`] taxonomy.
//!
//! # Modules
//!
//! - [`cheque`] - Cheque frame layout and CBOR body decoding
//! - [`verify`] - Ed25519 verification over the tagged message
//! - [`invoice`] - Invoice decoding through the backend
//! - [`estimator`] - Route selection and routing fee computation
//! - [`executor`] - Lightning payment execution
//! - [`quote`] / [`pay`] - The two request pipelines
//! - [`ledger`] - Highest-redeemed-index tracking per channel
//! - [`lightning`] - The [`LightningBackend`] seam and its wire types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod adaptor;
pub mod cheque;
pub mod config;
pub mod effect;
pub mod error;
pub mod estimator;
pub mod executor;
pub mod invoice;
pub mod ledger;
pub mod lightning;
pub mod pay;
pub mod quote;
pub mod timestamp;
pub mod types;
pub mod verify;

#[cfg(test)]
mod mock;

pub use adaptor::Adaptor;
pub use config::AdaptorConfig;
pub use error::{AdaptorError, BackendError, ErrorKind};
pub use lightning::LightningBackend;
