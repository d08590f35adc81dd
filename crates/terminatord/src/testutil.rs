use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use clusterlib::cluster::ClusterApi;
use clusterlib::error::Error;
use clusterlib::pod::PodRecord;

use crate::args::TerminationOptions;

/// In-memory cluster: canned namespaces and pods, scripted failures, and
/// bookkeeping to observe delete calls and their concurrency.
pub struct FakeCluster {
    namespaces: Vec<String>,
    pods: Mutex<HashMap<String, Vec<PodRecord>>>,
    fail_list_pods: AtomicBool,
    failing_deletes: Mutex<Vec<String>>,
    delete_delay: Mutex<Duration>,
    deletes: Mutex<Vec<(String, String, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCluster {
    pub fn new(namespaces: &[&str]) -> Self {
        Self {
            namespaces: namespaces.iter().map(|ns| (*ns).to_owned()).collect(),
            pods: Mutex::new(HashMap::new()),
            fail_list_pods: AtomicBool::new(false),
            failing_deletes: Mutex::new(Vec::new()),
            delete_delay: Mutex::new(Duration::ZERO),
            deletes: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn add_pod(&self, pod: PodRecord) {
        self.pods
            .lock()
            .unwrap()
            .entry(pod.namespace.clone())
            .or_default()
            .push(pod);
    }

    /// Make every pod list call fail with a timeout from now on.
    pub fn fail_list_pods(&self) {
        self.fail_list_pods.store(true, Ordering::SeqCst);
    }

    /// Make deleting the named pod fail with a timeout.
    pub fn fail_delete_of(&self, name: &str) {
        self.failing_deletes.lock().unwrap().push(name.to_owned());
    }

    /// Make every delete call sleep, so concurrent calls overlap.
    pub fn set_delete_delay(&self, delay: Duration) {
        *self.delete_delay.lock().unwrap() = delay;
    }

    /// Every delete call observed, in completion order.
    pub fn deletes(&self) -> Vec<(String, String, u32)> {
        self.deletes.lock().unwrap().clone()
    }

    /// High-water mark of concurrently in-flight delete calls.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, Error> {
        Ok(self.namespaces.clone())
    }

    async fn get_namespace(&self, name: &str) -> Result<String, Error> {
        if self.namespaces.iter().any(|ns| ns == name) {
            Ok(name.to_owned())
        } else {
            Err(Error::NamespaceNotFound(name.to_owned()))
        }
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, Error> {
        if self.fail_list_pods.load(Ordering::SeqCst) {
            return Err(Error::Timeout);
        }

        Ok(self
            .pods
            .lock()
            .unwrap()
            .get(namespace)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_seconds: u32,
    ) -> Result<(), Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delete_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.deletes.lock().unwrap().push((
            namespace.to_owned(),
            name.to_owned(),
            grace_period_seconds,
        ));

        if self.failing_deletes.lock().unwrap().iter().any(|p| p == name) {
            Err(Error::Timeout)
        } else {
            Ok(())
        }
    }
}

pub fn running_pod(namespace: &str, name: &str) -> PodRecord {
    PodRecord {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        deletion_timestamp: None,
        status_reason: None,
        status_phase: Some("Running".to_owned()),
    }
}

pub fn terminating_pod(
    namespace: &str,
    name: &str,
    age_minutes: i64,
    now: DateTime<Utc>,
) -> PodRecord {
    PodRecord {
        deletion_timestamp: Some(now - chrono::Duration::minutes(age_minutes)),
        ..running_pod(namespace, name)
    }
}

pub fn evicted_pod(namespace: &str, name: &str) -> PodRecord {
    PodRecord {
        status_reason: Some("Evicted".to_owned()),
        status_phase: Some("Failed".to_owned()),
        ..running_pod(namespace, name)
    }
}

/// Options with the production defaults, for tests to tweak.
pub fn options() -> TerminationOptions {
    TerminationOptions {
        namespace: "all".to_owned(),
        tick_interval: Duration::from_secs(300),
        channel_capacity: 10,
        grace_period_seconds: 30,
        terminate_evicted: true,
        stuck_threshold: chrono::Duration::minutes(30),
        one_shot: true,
    }
}
