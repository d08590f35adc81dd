use std::cmp;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;

use clusterlib::cluster::ClusterApi;
use clusterlib::pod::PodRecord;

use crate::types::CycleResult;

/// Delete every classified pod, with at most `capacity` delete calls in
/// flight at a time.  The two category sets are merged and deduplicated by
/// `(namespace, name)` first, so a pod satisfying both predicates still
/// receives exactly one delete call.  Returns once every job has reached a
/// terminal state.
pub async fn run<C>(
    api: Arc<C>,
    stuck_terminating: Vec<PodRecord>,
    evicted: Vec<PodRecord>,
    grace_period_seconds: u32,
    capacity: usize,
) -> CycleResult
where
    C: ClusterApi + Send + Sync + 'static,
{
    let mut result = CycleResult {
        stuck_terminating: stuck_terminating.len(),
        evicted: evicted.len(),
        ..CycleResult::default()
    };

    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(result.stuck_terminating + result.evicted);
    for pod in stuck_terminating.into_iter().chain(evicted) {
        if seen.insert(pod.key()) {
            jobs.push(pod);
        }
    }
    result.attempted = jobs.len();

    if jobs.is_empty() {
        return result;
    }

    // A capacity of zero would leave the queue with no workers to drain it.
    let capacity = cmp::max(capacity, 1);

    let (job_tx, job_rx) = mpsc::channel(capacity);
    let job_rx = Arc::new(Mutex::new(job_rx));
    let mut workers = Vec::with_capacity(capacity);
    for _ in 0..capacity {
        workers.push(tokio::spawn(worker(
            api.clone(),
            job_rx.clone(),
            grace_period_seconds,
        )));
    }

    for pod in jobs {
        if let Err(error) = job_tx.send(pod).await {
            // Workers only stop once the channel closes, so a send can only
            // fail if a worker panicked out from under the queue.
            tracing::error!(?error, "job queue unexpectedly closed");
            result.failed += 1;
        }
    }
    drop(job_tx);

    for handle in workers {
        match handle.await {
            Ok((deleted, failed)) => {
                result.deleted += deleted;
                result.failed += failed;
            }
            Err(error) => tracing::error!(?error, "worker task panicked"),
        }
    }

    result
}

/// One worker: pull jobs until the queue closes, deleting each pod.  A
/// failed deletion is logged and counted, never escalated.
async fn worker<C>(
    api: Arc<C>,
    job_rx: Arc<Mutex<Receiver<PodRecord>>>,
    grace_period_seconds: u32,
) -> (usize, usize)
where
    C: ClusterApi + Send + Sync + 'static,
{
    let mut deleted = 0;
    let mut failed = 0;

    loop {
        // Hold the lock only to dequeue, so the rest of the pool keeps
        // draining while this delete call is in flight.
        let job = { job_rx.lock().await.recv().await };
        match job {
            Some(pod) => {
                match api
                    .delete_pod(&pod.namespace, &pod.name, grace_period_seconds)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(
                            name = pod.name,
                            namespace = pod.namespace,
                            "pod successfully terminated"
                        );
                        deleted += 1;
                    }
                    Err(error) => {
                        tracing::warn!(
                            name = pod.name,
                            namespace = pod.namespace,
                            ?error,
                            "could not delete pod"
                        );
                        failed += 1;
                    }
                }
            }
            None => break,
        }
    }

    (deleted, failed)
}
