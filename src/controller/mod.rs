//! # Controller
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `reconciler`: reconciliation of the `CertManager` resource
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
