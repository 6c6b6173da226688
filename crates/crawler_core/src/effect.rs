use std::time::Duration;

use crate::{Task, WorkerEvent};

/// Work the scheduler asks its runner to perform. Every effect that does IO
/// eventually answers with a [`crate::Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `Msg::Tick` once `after` has elapsed.
    ScheduleTick { after: Duration },
    /// Claim the oldest unlocked task from the frontier.
    ClaimNext,
    /// Look up the crawl delay for the host of `task`.
    ResolveDelay { task: Task },
    /// Run the fetch pipeline for a claimed task.
    Dispatch { task: Task },
    /// Report a status line to the supervisor.
    Emit(WorkerEvent),
}
