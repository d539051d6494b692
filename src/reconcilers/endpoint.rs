//! Endpoint-driven reconciliation of NetworkFilesystem status
//!
//! Every change to an `Endpoints` object backing an NFS share recomputes the
//! status of the NetworkFilesystem of the same name: readiness, serving
//! address and a condition history. The status is written back only when it
//! actually changed.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::ResourceExt;
use tracing::{debug, info};

use crate::adapters::ClusterClient;
use crate::crd::{
    ConditionStatus, ConditionType, EndpointStatus, NetworkFSCondition, NetworkFSState,
    NetworkFSType, NetworkFilesystem,
};
use crate::reconcilers::conditions::update_conditions;
use crate::Result;

/// Only endpoints named after a volume claim belong to a network filesystem
pub const ENDPOINT_NAME_PREFIX: &str = "pvc-";

/// Namespace holding the share-manager services
pub const SERVICE_NAMESPACE: &str = "longhorn-system";

/// ClusterIP value of a headless service
pub const CLUSTER_IP_NONE: &str = "None";

const NOT_READY_REASON: &str = "Endpoint is not ready";
const NOT_READY_MESSAGE: &str = "Endpoint did not contain the corresponding address";
const READY_REASON: &str = "Endpoint is ready";
const READY_MESSAGE: &str = "Endpoint contains the corresponding address";
const CHANGED_REASON: &str = "Endpoint is changed";

/// Why an endpoint event was ignored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Endpoint is gone or being deleted
    Deleted,
    /// Endpoint name lacks the volume claim prefix
    UnmanagedName,
    /// NetworkFilesystem is not desired to be enabled
    NotEnabled,
    /// Service has a cluster IP, so traffic does not follow the endpoint
    ServiceRouted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Deleted => "deleted",
            SkipReason::UnmanagedName => "unmanaged_name",
            SkipReason::NotEnabled => "not_enabled",
            SkipReason::ServiceRouted => "service_routed",
        }
    }
}

/// Result of handling one endpoint event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Event ignored, nothing read or written past the failing guard
    Skipped(SkipReason),
    /// Computed status equals the stored one, nothing written
    Unchanged,
    /// Status subresource was written
    Updated,
}

/// Handles endpoint change events for NetworkFilesystem resources
pub struct EndpointReconciler<C> {
    client: C,
    namespace: String,
}

impl<C: ClusterClient> EndpointReconciler<C> {
    /// `namespace` is where NetworkFilesystem resources live
    pub fn new(client: C, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Handle a change of the endpoint `key`; `endpoint` is None once it is gone.
    pub async fn on_endpoint_change(
        &self,
        key: &str,
        endpoint: Option<&Endpoints>,
    ) -> Result<Outcome> {
        let endpoint = match endpoint {
            Some(ep) if ep.metadata.deletion_timestamp.is_none() => ep,
            _ => {
                debug!("Skip endpoint {} because it is deleted or deleting", key);
                return Ok(Outcome::Skipped(SkipReason::Deleted));
            }
        };

        let name = endpoint.name_any();
        if !name.starts_with(ENDPOINT_NAME_PREFIX) {
            return Ok(Outcome::Skipped(SkipReason::UnmanagedName));
        }

        info!("Handling endpoint {} change event", name);
        let networkfs = self
            .client
            .get_network_filesystem(&self.namespace, &name)
            .await?;

        if networkfs.spec.desired_state != NetworkFSState::Enabled {
            info!(
                "Skip endpoint change because NetworkFilesystem {} is not enabled",
                name
            );
            return Ok(Outcome::Skipped(SkipReason::NotEnabled));
        }

        let service = self.client.get_service(SERVICE_NAMESPACE, &name).await?;
        if !is_headless(&service) {
            info!("Skip endpoint change because service {} is not headless", name);
            return Ok(Outcome::Skipped(SkipReason::ServiceRouted));
        }

        let desired = desired_networkfs(&networkfs, endpoint, Utc::now());
        if desired == networkfs {
            debug!("NetworkFilesystem {} status is up to date", name);
            return Ok(Outcome::Unchanged);
        }

        self.client.update_network_filesystem_status(&desired).await?;

        let status = desired.status_or_default();
        info!(
            networkfs = %name,
            status = ?status.status,
            endpoint = %status.endpoint,
            "Updated NetworkFilesystem status"
        );
        Ok(Outcome::Updated)
    }
}

/// True when the service has no virtual IP and is routed through its endpoints
pub fn is_headless(service: &Service) -> bool {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.as_deref())
        .is_some_and(|ip| ip == CLUSTER_IP_NONE)
}

/// The canonical serving address: first address of the first subset
pub fn serving_address(endpoint: &Endpoints) -> Option<&str> {
    endpoint
        .subsets
        .as_ref()?
        .first()?
        .addresses
        .as_ref()?
        .first()
        .map(|addr| addr.ip.as_str())
}

/// Compute the NetworkFilesystem as it should look for the given endpoint.
///
/// Works on a clone; `current` is never touched.
pub fn desired_networkfs(
    current: &NetworkFilesystem,
    endpoint: &Endpoints,
    now: DateTime<Utc>,
) -> NetworkFilesystem {
    let mut desired = current.clone();
    let mut status = current.status_or_default();
    let address = serving_address(endpoint);

    // A transition stamps its conditions with `now` even if their text repeats
    let moved = status.endpoint != address.unwrap_or_default()
        || (status.status == EndpointStatus::Ready) != address.is_some();

    match address {
        None => {
            status.endpoint = String::new();
            status.status = EndpointStatus::NotReady;
            update_conditions(
                &mut status.network_fs_conds,
                condition(ConditionType::NotReady, NOT_READY_REASON, NOT_READY_MESSAGE, now),
                moved,
            );
        }
        Some(address) => {
            if status.endpoint != address {
                let message = changed_message(&status.endpoint, address);
                update_conditions(
                    &mut status.network_fs_conds,
                    condition(ConditionType::EndpointChanged, CHANGED_REASON, &message, now),
                    moved,
                );
            }
            status.endpoint = address.to_string();
            status.status = EndpointStatus::Ready;
            update_conditions(
                &mut status.network_fs_conds,
                condition(ConditionType::Ready, READY_REASON, READY_MESSAGE, now),
                moved,
            );
        }
    }
    status.type_ = NetworkFSType::Nfs;
    status.state = NetworkFSState::Enabling;

    desired.status = Some(status);
    desired
}

fn changed_message(previous: &str, address: &str) -> String {
    if previous.is_empty() {
        format!("Endpoint address is initialized with {}", address)
    } else {
        format!("Endpoint address is changed from {} to {}", previous, address)
    }
}

fn condition(
    type_: ConditionType,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) -> NetworkFSCondition {
    NetworkFSCondition {
        type_,
        status: ConditionStatus::True,
        last_transition_time: now,
        reason: reason.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::NetworkFilesystemSpec;
    use crate::reconcilers::conditions::find_condition;
    use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn endpoint(ips: &[&str]) -> Endpoints {
        Endpoints {
            metadata: ObjectMeta {
                name: Some("pvc-abc".to_string()),
                ..Default::default()
            },
            subsets: Some(vec![EndpointSubset {
                addresses: Some(
                    ips.iter()
                        .map(|ip| EndpointAddress {
                            ip: ip.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }]),
        }
    }

    fn networkfs(address: &str) -> NetworkFilesystem {
        let mut fs = NetworkFilesystem::new(
            "pvc-abc",
            NetworkFilesystemSpec {
                network_fs_name: "pvc-abc".to_string(),
                desired_state: NetworkFSState::Enabled,
                ..Default::default()
            },
        );
        fs.status = Some(crate::crd::NetworkFilesystemStatus {
            endpoint: address.to_string(),
            ..Default::default()
        });
        fs
    }

    #[test]
    fn serving_address_uses_first_address_only() {
        let mut ep = endpoint(&["10.0.0.5", "10.0.0.6"]);
        ep.subsets.as_mut().unwrap().push(EndpointSubset {
            addresses: Some(vec![EndpointAddress {
                ip: "10.0.0.7".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        });
        assert_eq!(serving_address(&ep), Some("10.0.0.5"));
    }

    #[test]
    fn serving_address_empty_first_subset() {
        let mut ep = endpoint(&[]);
        ep.subsets.as_mut().unwrap().push(EndpointSubset {
            addresses: Some(vec![EndpointAddress {
                ip: "10.0.0.7".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        });
        assert_eq!(serving_address(&ep), None);
    }

    #[test]
    fn headless_requires_sentinel() {
        let mut svc = Service {
            spec: Some(ServiceSpec {
                cluster_ip: Some(CLUSTER_IP_NONE.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(is_headless(&svc));
        svc.spec.as_mut().unwrap().cluster_ip = Some("10.43.0.12".to_string());
        assert!(!is_headless(&svc));
        svc.spec = None;
        assert!(!is_headless(&svc));
    }

    #[test]
    fn first_address_reports_initialization() {
        let desired = desired_networkfs(&networkfs(""), &endpoint(&["10.0.0.5"]), Utc::now());
        let status = desired.status.unwrap();
        let changed =
            find_condition(&status.network_fs_conds, ConditionType::EndpointChanged).unwrap();
        assert_eq!(
            changed.message,
            "Endpoint address is initialized with 10.0.0.5"
        );
    }

    #[test]
    fn changed_address_reports_previous() {
        let desired = desired_networkfs(
            &networkfs("10.0.0.2"),
            &endpoint(&["10.0.0.9"]),
            Utc::now(),
        );
        let status = desired.status.unwrap();
        let changed =
            find_condition(&status.network_fs_conds, ConditionType::EndpointChanged).unwrap();
        assert_eq!(
            changed.message,
            "Endpoint address is changed from 10.0.0.2 to 10.0.0.9"
        );
        assert_eq!(changed.reason, CHANGED_REASON);
    }

    #[test]
    fn unchanged_address_adds_no_changed_condition() {
        let desired = desired_networkfs(
            &networkfs("10.0.0.5"),
            &endpoint(&["10.0.0.5"]),
            Utc::now(),
        );
        let status = desired.status.unwrap();
        assert!(find_condition(&status.network_fs_conds, ConditionType::EndpointChanged).is_none());
        assert_eq!(status.status, EndpointStatus::Ready);
    }

    #[test]
    fn recovery_restamps_conditions() {
        use chrono::TimeZone;
        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();

        let ready = desired_networkfs(&networkfs(""), &endpoint(&["10.0.0.5"]), at(1000));
        let down = desired_networkfs(&ready, &endpoint(&[]), at(2000));
        let back = desired_networkfs(&down, &endpoint(&["10.0.0.5"]), at(3000));

        let status = back.status.unwrap();
        assert_eq!(status.status, EndpointStatus::Ready);
        let stamp = |type_| {
            find_condition(&status.network_fs_conds, type_)
                .unwrap()
                .last_transition_time
                .timestamp()
        };
        assert_eq!(stamp(ConditionType::Ready), 3000);
        assert_eq!(stamp(ConditionType::EndpointChanged), 3000);
        assert_eq!(stamp(ConditionType::NotReady), 2000);
        assert_eq!(status.network_fs_conds.len(), 3);
    }

    #[test]
    fn steady_state_keeps_stamps() {
        use chrono::TimeZone;
        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();

        let ready = desired_networkfs(&networkfs(""), &endpoint(&["10.0.0.5"]), at(1000));
        let again = desired_networkfs(&ready, &endpoint(&["10.0.0.5"]), at(5000));
        assert_eq!(ready, again);

        let down = desired_networkfs(&ready, &endpoint(&[]), at(6000));
        let still_down = desired_networkfs(&down, &endpoint(&[]), at(7000));
        assert_eq!(down, still_down);
    }

    #[test]
    fn current_is_left_untouched() {
        let current = networkfs("10.0.0.2");
        let before = current.clone();
        let _ = desired_networkfs(&current, &endpoint(&[]), Utc::now());
        assert_eq!(current, before);
    }
}
