//! Cluster reads and writes used by the endpoint reconciler

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::crd::NetworkFilesystem;
use crate::{Error, Result};

/// The three cluster operations the reconciler needs.
///
/// Kept behind a trait so tests can drive the reconciler without an API server.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Get a NetworkFilesystem by name
    async fn get_network_filesystem(&self, namespace: &str, name: &str)
        -> Result<NetworkFilesystem>;

    /// Get a Service by name
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service>;

    /// Write the status subresource of a NetworkFilesystem
    async fn update_network_filesystem_status(&self, networkfs: &NetworkFilesystem) -> Result<()>;
}

/// `ClusterClient` backed by a live Kubernetes client
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_network_filesystem(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<NetworkFilesystem> {
        let api: Api<NetworkFilesystem> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(|source| Error::Lookup {
            kind: "NetworkFilesystem",
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(|source| Error::Lookup {
            kind: "Service",
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })
    }

    async fn update_network_filesystem_status(&self, networkfs: &NetworkFilesystem) -> Result<()> {
        let namespace = networkfs.namespace().unwrap_or_default();
        let name = networkfs.name_any();
        let api: Api<NetworkFilesystem> = Api::namespaced(self.client.clone(), &namespace);

        // resourceVersion makes the API server reject writes based on a stale read
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": networkfs.resource_version() },
            "status": networkfs.status,
        });

        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|source| Error::Update {
                namespace: namespace.clone(),
                name: name.clone(),
                source,
            })?;

        debug!("Patched status of NetworkFilesystem {}/{}", namespace, name);
        Ok(())
    }
}
