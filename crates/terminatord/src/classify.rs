use chrono::{DateTime, Duration, Utc};

use clusterlib::pod::PodRecord;

/// Status reason the cluster sets on pods it has evicted.
pub static EVICTED_REASON: &str = "Evicted";

/// Pods the API server marked for deletion longer ago than `threshold`.  A
/// pod whose deletion timestamp is exactly `threshold` old is still inside
/// its shutdown window and is not selected.
pub fn stuck_terminating(
    pods: &[PodRecord],
    threshold: Duration,
    now: DateTime<Utc>,
) -> Vec<PodRecord> {
    pods.iter()
        .filter(|pod| matches!(pod.deletion_timestamp, Some(ts) if now - ts > threshold))
        .cloned()
        .collect()
}

/// Pods the cluster evicted and left behind in a terminal status.  The
/// status reason is the canonical signal; a Pending phase does not imply
/// eviction and is not checked.
pub fn evicted(pods: &[PodRecord]) -> Vec<PodRecord> {
    pods.iter()
        .filter(|pod| pod.status_reason.as_deref() == Some(EVICTED_REASON))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testutil;

    #[test]
    fn pod_without_deletion_timestamp_is_never_stuck() {
        let now = Utc::now();
        let pods = vec![testutil::running_pod("default", "web-0")];

        assert!(stuck_terminating(&pods, Duration::minutes(30), now).is_empty());
    }

    #[test]
    fn pod_older_than_threshold_is_stuck() {
        let now = Utc::now();
        let pods = vec![testutil::terminating_pod("default", "web-0", 40, now)];

        let stuck = stuck_terminating(&pods, Duration::minutes(30), now);
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].name, "web-0");
    }

    #[test]
    fn pod_younger_than_threshold_is_not_stuck() {
        let now = Utc::now();
        let pods = vec![testutil::terminating_pod("default", "web-0", 10, now)];

        assert!(stuck_terminating(&pods, Duration::minutes(30), now).is_empty());
    }

    #[test]
    fn pod_exactly_at_threshold_is_not_stuck() {
        let now = Utc::now();
        let pods = vec![testutil::terminating_pod("default", "web-0", 30, now)];

        assert!(stuck_terminating(&pods, Duration::minutes(30), now).is_empty());
    }

    #[test]
    fn evicted_pods_are_selected_by_status_reason() {
        let pods = vec![
            testutil::evicted_pod("default", "web-0"),
            testutil::running_pod("default", "web-1"),
        ];

        let evicted = evicted(&pods);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].name, "web-0");
    }

    #[test]
    fn pending_phase_does_not_imply_eviction() {
        let mut pod = testutil::running_pod("default", "web-0");
        pod.status_phase = Some("Pending".to_owned());

        assert!(evicted(&[pod]).is_empty());
    }

    #[test]
    fn empty_input_yields_empty_sets() {
        let now = Utc::now();
        assert!(stuck_terminating(&[], Duration::minutes(30), now).is_empty());
        assert!(evicted(&[]).is_empty());
    }
}
