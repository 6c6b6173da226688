use std::fmt;

/// Display category of a worker event. The console colors by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Loaded,
    Visiting,
    Added,
    Blocked,
    Warning,
    Error,
}

impl EventKind {
    /// The word the console highlights for this category.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Loaded => "Loaded",
            EventKind::Visiting => "Visiting",
            EventKind::Added => "Added",
            EventKind::Blocked => "Blocked",
            EventKind::Warning => "Warning",
            EventKind::Error => "Error",
        }
    }
}

/// Where a recovered error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorContext {
    LoadVisited,
    Claim,
    Enqueue,
    Robots,
    Fetch,
    Persist,
}

impl ErrorContext {
    fn describe(self) -> &'static str {
        match self {
            ErrorContext::LoadVisited => "while loading visited URLs from database",
            ErrorContext::Claim => "getting URL from queue",
            ErrorContext::Enqueue => "adding URL to queue",
            ErrorContext::Robots => "while fetching robots.txt",
            ErrorContext::Fetch => "while fetching web page",
            ErrorContext::Persist => "saving to database",
        }
    }
}

/// Human-readable status reported by a worker to its supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Loaded { count: usize },
    Visiting { url: String },
    Added { url: String },
    Blocked { url: String },
    Warning { message: String },
    Error { context: ErrorContext, message: String },
}

impl WorkerEvent {
    pub fn warning(message: impl Into<String>) -> Self {
        WorkerEvent::Warning {
            message: message.into(),
        }
    }

    pub fn error(context: ErrorContext, message: impl Into<String>) -> Self {
        WorkerEvent::Error {
            context,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Loaded { .. } => EventKind::Loaded,
            WorkerEvent::Visiting { .. } => EventKind::Visiting,
            WorkerEvent::Added { .. } => EventKind::Added,
            WorkerEvent::Blocked { .. } => EventKind::Blocked,
            WorkerEvent::Warning { .. } => EventKind::Warning,
            WorkerEvent::Error { .. } => EventKind::Error,
        }
    }
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerEvent::Loaded { count } => {
                write!(f, "Loaded {count} visited URLs from the database.")
            }
            WorkerEvent::Visiting { url } => write!(f, "Visiting : {url}"),
            WorkerEvent::Added { url } => write!(f, "Added '{url}' to database"),
            WorkerEvent::Blocked { url } => write!(f, "Blocked by robots.txt : {url}"),
            WorkerEvent::Warning { message } => write!(f, "Warning - {message}"),
            WorkerEvent::Error { context, message } => {
                write!(f, "Error {} : {message}", context.describe())
            }
        }
    }
}
