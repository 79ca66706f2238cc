/// The external termination/reset collaborator an embedding program supplies to [`super::Optimizer`].
///
/// `terminate` fires exactly once, when the run ends for any reason (time limit, solution limit,
/// or a solution-requested convergence). `reset` is called before a new optimization is started on
/// an `Optimizer` that reuses the same monitor instance.
pub trait Monitor: Send + Sync {
    /// Called exactly once when the run terminates, with a human-readable reason.
    fn terminate(&self, reason: &str);

    /// Called before a new run starts on this monitor. The default does nothing.
    fn reset(&self) {}
}

/// A [`Monitor`] that does nothing, for embeddings that do not need termination notification.
#[derive(Debug, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn terminate(&self, _reason: &str) {}
}
