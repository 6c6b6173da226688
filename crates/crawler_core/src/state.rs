use std::collections::BTreeSet;
use std::time::Duration;

use crate::{DispatchOutcome, RateLimiter, TaskId};

/// Where the scheduling loop of one worker currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A claim is outstanding against the frontier.
    Claiming,
    /// A task was dispatched; waiting for its crawl delay before the next tick.
    DelayWait,
    /// Shutdown requested; draining in-flight fetches.
    Stopping,
    /// Nothing outstanding after shutdown.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub max_in_flight: usize,
    /// Backoff used when not ready, at the in-flight ceiling, or the queue is empty.
    pub poll_interval: Duration,
    /// Pacing used when robots.txt declares no crawl delay.
    pub default_delay: Duration,
}

impl SchedulerSettings {
    /// Default delay of `1000 / max_requests_per_second` milliseconds.
    pub fn from_requests_per_second(max_in_flight: usize, max_requests_per_second: u32) -> Self {
        Self {
            max_in_flight,
            default_delay: default_delay_for(max_requests_per_second),
            ..Self::default()
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_in_flight: 5,
            poll_interval: Duration::from_millis(100),
            default_delay: default_delay_for(5),
        }
    }
}

fn default_delay_for(max_requests_per_second: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(max_requests_per_second.max(1)))
}

/// Read-only snapshot of a worker's scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerView {
    pub phase: Phase,
    pub in_flight: usize,
    pub visited_loaded: bool,
    pub crawled: usize,
    pub blocked: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    settings: SchedulerSettings,
    limiter: RateLimiter,
    visited_loaded: bool,
    claiming: bool,
    awaiting_delay: Option<TaskId>,
    stopping: bool,
    in_flight: BTreeSet<TaskId>,
    crawled: usize,
    blocked: usize,
    failed: usize,
    skipped: usize,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new(SchedulerSettings::default())
    }
}

impl SchedulerState {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            limiter: RateLimiter::new(settings.max_in_flight),
            settings,
            visited_loaded: false,
            claiming: false,
            awaiting_delay: None,
            stopping: false,
            in_flight: BTreeSet::new(),
            crawled: 0,
            blocked: 0,
            failed: 0,
            skipped: 0,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        if self.stopping {
            if self.claiming || !self.in_flight.is_empty() {
                Phase::Stopping
            } else {
                Phase::Stopped
            }
        } else if self.claiming {
            Phase::Claiming
        } else if self.awaiting_delay.is_some() {
            Phase::DelayWait
        } else {
            Phase::Idle
        }
    }

    /// True once shutdown was requested and nothing is outstanding.
    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::Stopped
    }

    /// Slots currently held, including one held by an outstanding claim.
    pub fn slots_in_use(&self) -> usize {
        self.limiter.in_flight()
    }

    pub fn view(&self) -> SchedulerView {
        SchedulerView {
            phase: self.phase(),
            in_flight: self.in_flight.len(),
            visited_loaded: self.visited_loaded,
            crawled: self.crawled,
            blocked: self.blocked,
            failed: self.failed,
            skipped: self.skipped,
        }
    }

    pub(crate) fn visited_loaded(&self) -> bool {
        self.visited_loaded
    }

    pub(crate) fn mark_visited_loaded(&mut self) {
        self.visited_loaded = true;
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub(crate) fn begin_stopping(&mut self) {
        self.stopping = true;
        self.awaiting_delay = None;
    }

    /// A tick is only acted on when no claim or delay lookup is outstanding.
    pub(crate) fn step_in_progress(&self) -> bool {
        self.claiming || self.awaiting_delay.is_some()
    }

    pub(crate) fn try_begin_claim(&mut self) -> bool {
        if self.limiter.try_acquire() {
            self.claiming = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_claiming(&self) -> bool {
        self.claiming
    }

    /// The claim came back empty-handed: give the slot back.
    pub(crate) fn abandon_claim(&mut self) {
        self.claiming = false;
        self.limiter.release();
    }

    /// The claim produced a task; its slot now belongs to the dispatch.
    pub(crate) fn dispatch(&mut self, task_id: TaskId, await_delay: bool) {
        self.claiming = false;
        self.in_flight.insert(task_id);
        if await_delay {
            self.awaiting_delay = Some(task_id);
        }
    }

    /// Returns true when `task_id` is the task whose delay the loop waits on.
    pub(crate) fn take_delay(&mut self, task_id: TaskId) -> bool {
        if self.awaiting_delay == Some(task_id) {
            self.awaiting_delay = None;
            true
        } else {
            false
        }
    }

    /// Returns false for a task this worker never dispatched.
    pub(crate) fn finish(&mut self, task_id: TaskId, outcome: DispatchOutcome) -> bool {
        if !self.in_flight.remove(&task_id) {
            return false;
        }
        self.limiter.release();
        match outcome {
            DispatchOutcome::Crawled => self.crawled += 1,
            DispatchOutcome::Blocked => self.blocked += 1,
            DispatchOutcome::Skipped => self.skipped += 1,
            DispatchOutcome::Failed => self.failed += 1,
        }
        true
    }
}
