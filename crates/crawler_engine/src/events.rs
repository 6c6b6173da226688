use std::fmt;

use crawler_core::WorkerEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Identity of a worker under a supervisor, starting at 1.
pub type WorkerId = usize;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

/// How a worker thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    Normal,
    Abnormal { code: i32, reason: String },
}

impl WorkerExit {
    pub fn code(&self) -> i32 {
        match self {
            WorkerExit::Normal => 0,
            WorkerExit::Abnormal { code, .. } => *code,
        }
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Normal => write!(f, "exited with code 0"),
            WorkerExit::Abnormal { code, reason } => {
                write!(f, "exited with code {code} ({reason})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Worker { worker: WorkerId, event: WorkerEvent },
    Exited { worker: WorkerId, exit: WorkerExit },
}

/// Forwards a worker's events to its supervisor, tagged with the worker id.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    worker: WorkerId,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
}

impl ChannelEventSink {
    pub fn new(worker: WorkerId, tx: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        Self { worker, tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.tx.send(SupervisorEvent::Worker {
            worker: self.worker,
            event,
        });
    }
}

/// Keeps every event in memory. Handy when no supervisor is listening.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<WorkerEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn snapshot(&self) -> Vec<WorkerEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: WorkerEvent) {
        self.events.lock().push(event);
    }
}
