//! # Runtime
//!
//! Process wiring around the reconciler.
//!
//! - `initialization`: rustls, tracing, metrics, HTTP server and client setup
//! - `watch_loop`: the kube-runtime controller over `CertManager`
//! - `error_policy`: per-resource Fibonacci backoff after failed passes

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
