use std::sync::Arc;

use chrono::Utc;

use clusterlib::cluster::ClusterApi;

use crate::args::TerminationOptions;
use crate::classify;
use crate::enumerate;
use crate::scheduler;
use crate::types::CycleResult;

/// Run one enumerate -> classify -> terminate cycle against one cluster.
/// An enumeration failure abandons the cycle before any deletion; the next
/// scheduled tick is the only retry.
pub async fn run_cycle<C>(api: Arc<C>, options: &TerminationOptions) -> CycleResult
where
    C: ClusterApi + Send + Sync + 'static,
{
    let pods = match enumerate::enumerate(api.as_ref(), &options.namespace).await {
        Ok(pods) => pods,
        Err(error) => {
            tracing::warn!(?error, "could not enumerate pods, skipping cycle");
            return CycleResult::aborted();
        }
    };

    let stuck = classify::stuck_terminating(&pods, options.stuck_threshold, Utc::now());
    if stuck.is_empty() {
        tracing::info!(state = "terminating", "no pod found");
    } else {
        tracing::info!(state = "terminating", pod_count = stuck.len(), "found pods");
    }

    let evicted = if options.terminate_evicted {
        let evicted = classify::evicted(&pods);
        if evicted.is_empty() {
            tracing::info!(state = "evicted", "no pod found");
        } else {
            tracing::info!(state = "evicted", pod_count = evicted.len(), "found pods");
        }
        evicted
    } else {
        tracing::debug!("will not terminate evicted pods");
        Vec::new()
    };

    let result = scheduler::run(
        api,
        stuck,
        evicted,
        options.grace_period_seconds,
        options.channel_capacity,
    )
    .await;

    tracing::info!(
        stuck_terminating = result.stuck_terminating,
        evicted = result.evicted,
        attempted = result.attempted,
        deleted = result.deleted,
        failed = result.failed,
        "termination cycle complete"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testutil::{self, FakeCluster};

    #[tokio::test]
    async fn stuck_pod_older_than_threshold_is_deleted() {
        let api = Arc::new(FakeCluster::new(&["default"]));
        api.add_pod(testutil::terminating_pod("default", "web-0", 40, Utc::now()));

        let result = run_cycle(api.clone(), &testutil::options()).await;

        assert_eq!(result.stuck_terminating, 1);
        assert_eq!(result.deleted, 1);
        assert_eq!(api.deletes().len(), 1);
    }

    #[tokio::test]
    async fn pod_inside_its_shutdown_window_is_untouched() {
        let api = Arc::new(FakeCluster::new(&["default"]));
        api.add_pod(testutil::terminating_pod("default", "web-0", 10, Utc::now()));

        let result = run_cycle(api.clone(), &testutil::options()).await;

        assert_eq!(result.deleted, 0);
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn evicted_pod_is_deleted_and_running_pod_untouched() {
        let api = Arc::new(FakeCluster::new(&["default"]));
        api.add_pod(testutil::evicted_pod("default", "web-0"));
        api.add_pod(testutil::running_pod("default", "web-1"));

        let result = run_cycle(api.clone(), &testutil::options()).await;

        assert_eq!(result.evicted, 1);
        assert_eq!(result.deleted, 1);
        assert_eq!(
            api.deletes(),
            vec![("default".to_owned(), "web-0".to_owned(), 30)]
        );
    }

    #[tokio::test]
    async fn evicted_classification_can_be_disabled() {
        let api = Arc::new(FakeCluster::new(&["default"]));
        api.add_pod(testutil::evicted_pod("default", "web-0"));

        let mut options = testutil::options();
        options.terminate_evicted = false;
        let result = run_cycle(api.clone(), &options).await;

        assert_eq!(result.evicted, 0);
        assert_eq!(result.deleted, 0);
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn enumeration_failure_issues_no_deletes() {
        let api = Arc::new(FakeCluster::new(&["default"]));
        api.add_pod(testutil::evicted_pod("default", "web-0"));
        api.fail_list_pods();

        let result = run_cycle(api.clone(), &testutil::options()).await;

        assert!(result.enumeration_failed);
        assert_eq!(result, CycleResult::aborted());
        assert!(api.deletes().is_empty());
    }
}
