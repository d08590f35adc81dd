use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;

/// One pod observed during a termination cycle.  Records are rebuilt from
/// the cluster API on every enumeration and discarded with the cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    /// Set once the API server has begun graceful deletion of the pod.
    pub deletion_timestamp: Option<DateTime<Utc>>,
    pub status_reason: Option<String>,
    pub status_phase: Option<String>,
}

impl PodRecord {
    /// Identity used to deduplicate delete jobs within a cycle.
    pub fn key(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }
}

impl From<Pod> for PodRecord {
    fn from(pod: Pod) -> Self {
        let status = pod.status.unwrap_or_default();

        Self {
            name: pod.metadata.name.unwrap_or_default(),
            namespace: pod.metadata.namespace.unwrap_or_default(),
            deletion_timestamp: pod.metadata.deletion_timestamp.map(|t| t.0),
            status_reason: status.reason,
            status_phase: status.phase,
        }
    }
}
