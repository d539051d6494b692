//! NetworkFilesystem endpoint controller
//!
//! Keeps the status of `NetworkFilesystem` resources in line with the
//! `Endpoints` of the headless service that serves each NFS share.

pub mod adapters;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;

pub use error::{Error, Result};
