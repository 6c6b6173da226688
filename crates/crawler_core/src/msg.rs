use std::time::Duration;

use crate::{Task, TaskId};

/// How a dispatched task ended. Every variant releases the rate-limiter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Fetched, extracted and persisted.
    Crawled,
    /// Denied by robots.txt; nothing was fetched.
    Blocked,
    /// Already in the visited index.
    Skipped,
    /// Fetch or persistence failed. The task is not retried.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The visited index finished hydrating. Opens the startup barrier.
    VisitedLoaded { count: usize },
    /// Timer wake-up: try to claim the next task.
    Tick,
    /// The frontier handed us a task; it is no longer in the queue.
    Claimed(Task),
    /// The frontier had nothing unlocked to hand out.
    QueueEmpty,
    /// The store failed during a claim. Treated as an empty queue.
    ClaimFailed { reason: String },
    /// Crawl delay for the host of a claimed task.
    DelayResolved { task_id: TaskId, delay: Duration },
    /// A dispatched pipeline completed, successfully or not.
    FetchFinished {
        task_id: TaskId,
        outcome: DispatchOutcome,
    },
    /// Stop claiming and drain in-flight fetches.
    Shutdown,
}
