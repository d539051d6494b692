//! Controller implementations for watching and reconciling resources

pub mod endpoint_controller;

use std::sync::Arc;

use kube::Client;

use crate::adapters::KubeClusterClient;
use crate::config::Config;
use crate::reconcilers::endpoint::EndpointReconciler;

/// Shared context for controllers
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Endpoint reconciler bound to the live cluster
    pub reconciler: EndpointReconciler<KubeClusterClient>,
    /// Node this controller runs on
    pub node_name: Option<String>,
}

impl Context {
    /// Create a new context
    pub fn new(client: Client, config: &Config) -> Arc<Self> {
        Arc::new(Self {
            reconciler: EndpointReconciler::new(
                KubeClusterClient::new(client.clone()),
                config.namespace.clone(),
            ),
            client,
            node_name: config.node_name.clone(),
        })
    }
}
