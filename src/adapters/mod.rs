//! Adapters between the reconciler and the Kubernetes API

pub mod cluster;

pub use cluster::{ClusterClient, KubeClusterClient};
