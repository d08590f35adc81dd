use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use clusterlib::cluster::CredentialSource;
use clusterlib::error::Error;

use crate::args::{Args, TerminationOptions};
use crate::cycle;

/// Exit code when no configured context could obtain an API client.
pub static EXIT_CODE_ALL_CONTEXTS_FAILED: i32 = 1;

/// Spawn one independent task per configured cluster context and drive
/// cycles until completion (one-shot) or process termination.  Returns the
/// process exit code.
pub async fn run(args: Args) -> i32 {
    let sources = args.cluster.credential_sources();
    let one_shot = args.termination.one_shot;

    let mut contexts = Vec::with_capacity(sources.len());
    for source in sources {
        contexts.push(tokio::spawn(context_task(
            source,
            args.cluster.api_timeout,
            args.termination.clone(),
        )));
    }

    if one_shot {
        let (failed, total) = join_contexts(contexts).await;
        let code = one_shot_exit_code(failed, total);
        if code == 0 {
            tracing::info!("all contexts completed, exiting");
        }
        return code;
    }

    // Healthy contexts cycle forever, so joining every handle only
    // completes if every context died at setup.
    tokio::select! {
        () = wait_for_shutdown() => 0,
        _ = join_contexts(contexts) => {
            tracing::error!("every context failed at setup, exiting");
            EXIT_CODE_ALL_CONTEXTS_FAILED
        }
    }
}

/// One cluster context: connect once, then run cycles.  A connection
/// failure is fatal to this context only.
async fn context_task(
    source: CredentialSource,
    api_timeout: Duration,
    options: TerminationOptions,
) -> Result<(), Error> {
    let context = source.to_string();

    let cluster = match source.connect(api_timeout).await {
        Ok(cluster) => cluster,
        Err(error) => {
            tracing::error!(
                context,
                ?error,
                "fatal error occurred while connecting to cluster"
            );
            return Err(error);
        }
    };

    tracing::info!(context, api_server = cluster.api_server, "connected to cluster");
    let api = Arc::new(cluster);

    if options.one_shot {
        cycle::run_cycle(api, &options).await;
        tracing::info!(context, "one-shot cycle complete");
        return Ok(());
    }

    // The first tick fires immediately; later ticks wait out the interval.
    // Awaiting the cycle inside the loop means cycles for this context
    // never overlap.
    let mut ticker = tokio::time::interval(options.tick_interval);
    loop {
        ticker.tick().await;
        cycle::run_cycle(api.clone(), &options).await;
    }
}

/// Wait for every context task.  Returns how many failed, and the total.
async fn join_contexts(contexts: Vec<JoinHandle<Result<(), Error>>>) -> (usize, usize) {
    let total = contexts.len();
    let mut failed = 0;

    for handle in contexts {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => failed += 1,
            Err(error) => {
                tracing::error!(?error, "context task panicked");
                failed += 1;
            }
        }
    }

    (failed, total)
}

/// Individual context failures surface in logs only; the process exits
/// non-zero only when no context got off the ground at all.
fn one_shot_exit_code(failed: usize, total: usize) -> i32 {
    if total > 0 && failed == total {
        EXIT_CODE_ALL_CONTEXTS_FAILED
    } else {
        0
    }
}

/// Block until SIGTERM or SIGINT.
async fn wait_for_shutdown() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::error!(?error, "could not subscribe to SIGTERM");
            process::exit(EXIT_CODE_ALL_CONTEXTS_FAILED);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(error) => {
            tracing::error!(?error, "could not subscribe to SIGINT");
            process::exit(EXIT_CODE_ALL_CONTEXTS_FAILED);
        }
    };

    tokio::select! {
        _ = sigterm.recv() => (),
        _ = sigint.recv() => (),
    }

    tracing::info!("received shutdown signal, terminating...");
}
