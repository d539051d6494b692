//! NetworkFilesystem Custom Resource Definition

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// NetworkFilesystem resource specification
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "harvesterhci.io",
    version = "v1beta1",
    kind = "NetworkFilesystem",
    plural = "networkfilesystems",
    singular = "networkfilesystem",
    shortname = "netfs",
    namespaced,
    status = "NetworkFilesystemStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name": "DesiredState", "type": "string", "jsonPath": ".spec.desiredState"}"#,
    printcolumn = r#"{"name": "Status", "type": "string", "jsonPath": ".status.status"}"#,
    printcolumn = r#"{"name": "Endpoint", "type": "string", "jsonPath": ".status.endpoint"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFilesystemSpec {
    /// Name of the backing volume export, usually identical to the resource name
    #[serde(rename = "networkFSName")]
    pub network_fs_name: String,

    /// State requested by the owning controller
    #[serde(default)]
    pub desired_state: NetworkFSState,

    /// Address a client would rather mount when several are available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_endpoint: Option<String>,

    /// Path exported by the NFS server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
}

/// Lifecycle state of a network filesystem
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum NetworkFSState {
    Enabled,
    Enabling,
    #[default]
    Disabled,
    Disabling,
    Unknown,
}

/// Readiness of the serving endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum EndpointStatus {
    Ready,
    #[default]
    NotReady,
}

/// Filesystem protocol
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum NetworkFSType {
    #[default]
    #[serde(rename = "NFS")]
    Nfs,
}

/// NetworkFilesystem status
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFilesystemStatus {
    /// Last known serving address, empty when none
    #[serde(default)]
    pub endpoint: String,

    /// Endpoint readiness
    #[serde(default)]
    pub status: EndpointStatus,

    /// Filesystem protocol
    #[serde(default, rename = "type")]
    pub type_: NetworkFSType,

    /// Observed lifecycle state
    #[serde(default)]
    pub state: NetworkFSState,

    /// Mount options clients should use
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_opts: String,

    /// Condition history, one entry per condition type
    #[serde(default, rename = "networkFSConds")]
    pub network_fs_conds: Vec<NetworkFSCondition>,
}

/// Condition type recorded in the history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    Ready,
    NotReady,
    EndpointChanged,
}

/// Condition status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Status condition
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFSCondition {
    /// Condition type
    #[serde(rename = "type")]
    pub type_: ConditionType,

    /// Status (True, False, Unknown)
    pub status: ConditionStatus,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    /// Machine-oriented reason
    #[serde(default)]
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl NetworkFilesystem {
    /// Status of the resource, or the zero status when none was ever written
    pub fn status_or_default(&self) -> NetworkFilesystemStatus {
        self.status.clone().unwrap_or_default()
    }
}
