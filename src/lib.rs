//! cert-manager Operator Library
//!
//! Installs and continuously converges the cert-manager suite (controller,
//! cainjector, webhook, CRDs, RBAC and admission webhooks) from a single
//! cluster-scoped `CertManager` resource named `cluster`.
//!
//! ## Quick Start
//!
//! ```rust
//! use cert_manager_operator::prelude::*;
//! ```
//!
//! ## Data flow
//!
//! `CertManager` spec → [`registry`] (version resolution) → [`synth`]
//! (with [`args`] for container flags) → desired objects → convergence in
//! [`controller::reconciler`] (using [`diff`]) → status aggregation →
//! status write-back.

pub mod args;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod crd_source;
pub mod diff;
pub mod events;
pub mod observability;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod store;
pub mod synth;
