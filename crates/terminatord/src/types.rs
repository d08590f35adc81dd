/// Outcome of one termination cycle against one cluster.  Used only for
/// logging; discarded at the end of the cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleResult {
    /// Pods classified as stuck in Terminating state.
    pub stuck_terminating: usize,
    /// Pods classified as evicted.
    pub evicted: usize,
    /// Delete calls issued, after deduplication.
    pub attempted: usize,
    /// Delete calls that succeeded.
    pub deleted: usize,
    /// Delete calls that failed.
    pub failed: usize,
    /// Set when enumeration failed and the cycle was abandoned before any
    /// deletion.
    pub enumeration_failed: bool,
}

impl CycleResult {
    /// The result of a cycle whose enumeration failed: no classification,
    /// no deletions.
    pub fn aborted() -> Self {
        Self {
            enumeration_failed: true,
            ..Self::default()
        }
    }
}
