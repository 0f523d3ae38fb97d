//! # Configuration
//!
//! Process-level settings, read once at startup.

mod controller;

pub use controller::ControllerConfig;
