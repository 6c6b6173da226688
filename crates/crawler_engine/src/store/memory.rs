use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use crawler_core::{CrawlResult, ResultId, Task, TaskId};
use parking_lot::Mutex;

use super::{Store, StoreError, StoreFactory};

#[derive(Debug, Default)]
struct Tables {
    queue: VecDeque<Task>,
    results: Vec<(ResultId, CrawlResult)>,
    next_task_id: i64,
    next_result_id: i64,
}

/// In-process store. A claim pops the queue head under one lock, which is
/// the whole of its atomicity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for url in urls {
            store.push(url.as_ref());
        }
        store
    }

    fn push(&self, url: &str) -> TaskId {
        let mut tables = self.tables.lock();
        tables.next_task_id += 1;
        let id = TaskId(tables.next_task_id);
        tables.queue.push_back(Task {
            id,
            url: url.to_string(),
            created_at: Utc::now(),
        });
        id
    }

    /// Queued URLs, oldest first.
    pub fn queued_urls(&self) -> Vec<String> {
        self.tables
            .lock()
            .queue
            .iter()
            .map(|task| task.url.clone())
            .collect()
    }

    pub fn results(&self) -> Vec<CrawlResult> {
        self.tables
            .lock()
            .results
            .iter()
            .map(|(_, result)| result.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn load_visited(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .tables
            .lock()
            .results
            .iter()
            .map(|(_, result)| result.url.clone())
            .collect())
    }

    async fn save_result(&self, result: &CrawlResult) -> Result<ResultId, StoreError> {
        let mut tables = self.tables.lock();
        tables.next_result_id += 1;
        let id = ResultId(tables.next_result_id);
        tables.results.push((id, result.clone()));
        Ok(id)
    }

    async fn enqueue(&self, url: &str) -> Result<TaskId, StoreError> {
        Ok(self.push(url))
    }

    async fn claim_next(&self) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.lock().queue.pop_front())
    }

    async fn remove_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.tables.lock().queue.retain(|task| task.id != id);
        Ok(())
    }
}

/// Hands every worker the same in-process store.
#[derive(Debug, Clone)]
pub struct MemoryStoreFactory {
    store: Arc<MemoryStore>,
}

impl MemoryStoreFactory {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl StoreFactory for MemoryStoreFactory {
    async fn open(&self) -> Result<Arc<dyn Store>, StoreError> {
        Ok(self.store.clone())
    }
}
