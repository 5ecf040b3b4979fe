//! Axum integration for the shop order read API.
//!
//! This crate holds the HTTP edge shared by the listing endpoints:
//!
//! - [`AppError`]: maps [`QueryError`](shop_orders_core::QueryError) onto
//!   status codes and a `{ code, message }` JSON body
//! - [`ResultEnvelope`]: the `{ count, date, data }` response wrapper
//! - [`correlation_id_layer`] and the [`CorrelationId`] extractor
//! - liveness and readiness handlers
//!
//! # Request Flow
//!
//! ```text
//! request ─▶ correlation_id_layer ─▶ handler ─▶ service (ReadScope)
//!                                      │
//!            ◀── ResultEnvelope / AppError ◀┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod envelope;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use envelope::ResultEnvelope;
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
