use std::sync::Arc;

use crawler_core::{ErrorContext, Ledger, Task, WorkerEvent};
use crawler_logging::crawl_debug;
use parking_lot::Mutex;

use crate::{EventSink, Store, StoreError};

/// The shared pending-task queue, seen through one worker's dedup ledger.
#[derive(Clone)]
pub struct Frontier {
    store: Arc<dyn Store>,
    ledger: Arc<Mutex<Ledger>>,
}

impl Frontier {
    pub fn new(store: Arc<dyn Store>, ledger: Arc<Mutex<Ledger>>) -> Self {
        Self { store, ledger }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<Mutex<Ledger>> {
        &self.ledger
    }

    /// Hydrates the visited index from persisted results. Must finish before
    /// the first claim.
    pub async fn load_visited(&self) -> Result<usize, StoreError> {
        let urls = self.store.load_visited().await?;
        let count = urls.len();
        self.ledger.lock().hydrate(urls);
        Ok(count)
    }

    /// Claims and removes the oldest unlocked task. An `Err` leaves the row
    /// in place; callers treat it as an empty queue for this tick.
    pub async fn claim_next(&self) -> Result<Option<Task>, StoreError> {
        let task = self.store.claim_next().await?;
        if let Some(task) = &task {
            self.ledger.lock().claimed(&task.url);
        }
        Ok(task)
    }

    /// Enqueues a discovered link unless it was visited or this worker
    /// already queued it. Returns whether a row was inserted.
    pub async fn offer(&self, url: &str, sink: &dyn EventSink) -> bool {
        if !self.ledger.lock().reserve(url) {
            return false;
        }
        match self.store.enqueue(url).await {
            Ok(id) => {
                crawl_debug!("Queued {} as task {}", url, id);
                true
            }
            Err(err) => {
                self.ledger.lock().unreserve(url);
                sink.emit(WorkerEvent::error(ErrorContext::Enqueue, err.to_string()));
                false
            }
        }
    }
}
