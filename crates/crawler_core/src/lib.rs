//! Crawler core: pure data model, dedup bookkeeping and the worker scheduling state machine.
mod effect;
mod event;
mod limiter;
mod msg;
mod record;
mod state;
mod task;
mod update;
mod visited;

pub use effect::Effect;
pub use event::{ErrorContext, EventKind, WorkerEvent};
pub use limiter::RateLimiter;
pub use msg::{DispatchOutcome, Msg};
pub use record::{Alternate, CrawlResult, ExtractedPage, Icon, Image, OpenGraph};
pub use state::{Phase, SchedulerSettings, SchedulerState, SchedulerView};
pub use task::{ResultId, Task, TaskId};
pub use update::update;
pub use visited::{normalize_url_for_dedupe, Ledger, PendingSet, VisitedIndex};
