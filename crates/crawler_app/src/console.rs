//! Status lines printed on stdout, one per worker event.

use colored::{ColoredString, Colorize};
use crawler_core::{EventKind, WorkerEvent};
use crawler_engine::{SupervisorEvent, WorkerExit, WorkerId};

pub fn format_event(event: &SupervisorEvent) -> String {
    match event {
        SupervisorEvent::Worker { worker, event } => format_worker_event(*worker, event),
        SupervisorEvent::Exited { worker, exit } => format_exit(*worker, exit),
    }
}

fn format_worker_event(worker: WorkerId, event: &WorkerEvent) -> String {
    let line = event.to_string();
    let label = event.kind().label();
    match line.strip_prefix(label) {
        Some(rest) => format!("Worker {worker}: {}{rest}", paint(event.kind(), label)),
        None => format!("Worker {worker}: {line}"),
    }
}

fn format_exit(worker: WorkerId, exit: &WorkerExit) -> String {
    let line = format!("Worker {worker} {exit}");
    match exit {
        WorkerExit::Normal => line,
        WorkerExit::Abnormal { .. } => line.red().to_string(),
    }
}

fn paint(kind: EventKind, label: &str) -> ColoredString {
    match kind {
        EventKind::Error | EventKind::Blocked => label.red(),
        EventKind::Warning => label.yellow(),
        EventKind::Loaded | EventKind::Visiting | EventKind::Added => label.green(),
    }
}
