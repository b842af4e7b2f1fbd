//! HTTP front end for the chequepay adaptor.
//!
//! Exposes the quote and pay pipelines of [`chequepay::Adaptor`] over Axum,
//! backed by an LND node through [`chequepay_lnd::LndClient`].
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - HTTP rendering of adaptor errors
//! - [`config`] - Server configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;

pub use handlers::{AdaptorState, adaptor_router};
