use clusterlib::cluster::ClusterApi;
use clusterlib::error::Error;
use clusterlib::pod::PodRecord;

/// Namespace scope meaning "scan every namespace".
pub static ALL_NAMESPACES: &str = "all";

/// Build the candidate pod set for one cycle: every pod in the configured
/// namespace scope.  Any list failure aborts the whole enumeration, so a
/// cycle sees either a complete candidate set or none at all.
pub async fn enumerate<C: ClusterApi>(api: &C, namespace: &str) -> Result<Vec<PodRecord>, Error> {
    let namespaces = if namespace.eq_ignore_ascii_case(ALL_NAMESPACES) {
        api.list_namespaces().await?
    } else {
        vec![api.get_namespace(namespace).await?]
    };

    let mut pods = Vec::new();
    for ns in &namespaces {
        pods.extend(api.list_pods(ns).await?);
    }

    Ok(pods)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testutil::{self, FakeCluster};

    #[tokio::test]
    async fn all_scope_concatenates_every_namespace() {
        let api = FakeCluster::new(&["default", "kube-system"]);
        api.add_pod(testutil::running_pod("default", "web-0"));
        api.add_pod(testutil::running_pod("kube-system", "dns-0"));

        let pods = enumerate(&api, "all").await.unwrap();
        assert_eq!(pods.len(), 2);
    }

    #[tokio::test]
    async fn scope_sentinel_is_case_insensitive() {
        let api = FakeCluster::new(&["default"]);
        api.add_pod(testutil::running_pod("default", "web-0"));

        let pods = enumerate(&api, "ALL").await.unwrap();
        assert_eq!(pods.len(), 1);
    }

    #[tokio::test]
    async fn named_scope_lists_only_that_namespace() {
        let api = FakeCluster::new(&["default", "kube-system"]);
        api.add_pod(testutil::running_pod("default", "web-0"));
        api.add_pod(testutil::running_pod("kube-system", "dns-0"));

        let pods = enumerate(&api, "default").await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "web-0");
    }

    #[tokio::test]
    async fn missing_namespace_is_an_error() {
        let api = FakeCluster::new(&["default"]);

        let error = enumerate(&api, "absent").await.unwrap_err();
        assert!(matches!(error, Error::NamespaceNotFound(ns) if ns == "absent"));
    }

    #[tokio::test]
    async fn list_failure_discards_partial_results() {
        let api = FakeCluster::new(&["default", "kube-system"]);
        api.add_pod(testutil::running_pod("default", "web-0"));
        api.fail_list_pods();

        assert!(enumerate(&api, "all").await.is_err());
    }
}
