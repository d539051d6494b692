//! Custom Resource Definitions watched by the controller

mod network_filesystem;

pub use network_filesystem::*;

use kube::CustomResourceExt;

/// Generate CRD YAML manifests for all custom resources
pub fn generate_crds() -> Result<Vec<String>, serde_yaml::Error> {
    Ok(vec![serde_yaml::to_string(&NetworkFilesystem::crd())?])
}
