use crate::error::ReconcileError;
use std::time::Duration;

/// The result of a single `Reconcile` call, before it is translated into
/// whatever requeue primitive the host controller-manager uses.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Nothing further to do; no requeue scheduled.
    Done,
    /// Requeue as soon as the work queue can schedule it again.
    RequeueImmediate,
    /// Requeue no sooner than `Duration` from now.
    RequeueAfter(Duration),
    /// Propagate the error to the surrounding manager, which applies its
    /// own backoff policy.
    Fatal(ReconcileError),
}
