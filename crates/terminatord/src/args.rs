use std::time::Duration;

/// Scan clusters for pods stuck in Terminating state or left behind as
/// Evicted, and delete them with bounded concurrency.
#[derive(Clone, Debug, clap::Parser)]
pub struct Args {
    #[command(flatten)]
    pub cluster: clusterlib::cluster::Config,

    #[command(flatten)]
    pub termination: TerminationOptions,

    /// Enable debug logging
    #[clap(long, short = 'v', env = "VERBOSE")]
    pub verbose: bool,
}

/// Termination settings.  Parsed once at startup and shared read-only by
/// every cluster context.
#[derive(Clone, Debug, clap::Args)]
pub struct TerminationOptions {
    /// Namespace to scan, or "all" for every namespace
    #[clap(long, default_value = "all", env = "NAMESPACE")]
    pub namespace: String,

    /// Interval (in minutes) between cycle starts when not running one-shot
    #[clap(
        long = "tick-interval-minutes",
        value_parser = |mins: &str| mins.parse().map(|m: u64| Duration::from_secs(m * 60)),
        default_value = "5",
        env = "TICK_INTERVAL_MINUTES"
    )]
    pub tick_interval: Duration,

    /// Maximum concurrent delete calls per cycle
    #[clap(long, default_value_t = 10, env = "CHANNEL_CAPACITY")]
    pub channel_capacity: usize,

    /// Grace period (in seconds) passed to each pod delete call
    #[clap(long, default_value_t = 30, env = "GRACE_PERIOD_SECONDS")]
    pub grace_period_seconds: u32,

    /// Terminate evicted pods as well as stuck terminating ones
    #[clap(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "TERMINATE_EVICTED"
    )]
    pub terminate_evicted: bool,

    /// Terminate pods that have been in Terminating state for longer than
    /// this many minutes
    #[clap(
        long = "terminating-state-minutes",
        value_parser = |mins: &str| mins.parse::<i64>().map(chrono::Duration::minutes),
        default_value = "30",
        env = "TERMINATING_STATE_MINUTES"
    )]
    pub stuck_threshold: chrono::Duration,

    /// Run a single cycle for every context and exit, instead of repeating
    /// on a timer in the background
    #[clap(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "ONE_SHOT"
    )]
    pub one_shot: bool,
}
