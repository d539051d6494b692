//! Error types for the NetworkFilesystem endpoint controller

use thiserror::Error;

/// Result type for the controller
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the controller
///
/// Only real failures live here. Conditions the reconciler deliberately
/// ignores (deleted endpoint, foreign name, disabled filesystem, routed
/// service) are reported as skips, not errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A related resource could not be fetched (not-found included)
    #[error("failed to get {kind} {namespace}/{name}: {source}")]
    Lookup {
        kind: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// The status subresource update was rejected
    #[error("failed to update status of NetworkFilesystem {namespace}/{name}: {source}")]
    Update {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true when the API server rejected a write on a stale resourceVersion
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::Update {
                source: kube::Error::Api(resp),
                ..
            } if resp.code == 409
        )
    }

    /// Returns true when the looked up resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Lookup {
                source: kube::Error::Api(resp),
                ..
            } if resp.code == 404
        )
    }

    /// Short label used for metrics
    pub fn metric_label(&self) -> &'static str {
        match self {
            Error::Lookup { .. } => "lookup",
            Error::Update { .. } => "update",
            Error::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} error", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn conflict_is_detected_on_update() {
        let err = Error::Update {
            namespace: "harvester-system".to_string(),
            name: "pvc-abc".to_string(),
            source: api_error(409, "Conflict"),
        };
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
        assert_eq!(err.metric_label(), "update");
    }

    #[test]
    fn not_found_is_detected_on_lookup() {
        let err = Error::Lookup {
            kind: "Service",
            namespace: "longhorn-system".to_string(),
            name: "pvc-abc".to_string(),
            source: api_error(404, "NotFound"),
        };
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(err.to_string().contains("Service longhorn-system/pvc-abc"));
    }
}
