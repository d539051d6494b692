//! Prometheus metrics for the NetworkFilesystem endpoint controller
//!
//! This module exposes metrics for monitoring controller health and performance.

pub mod prometheus;

pub use prometheus::*;
