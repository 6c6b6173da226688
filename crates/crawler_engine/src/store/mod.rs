//! Persistence of the frontier and crawl results.
mod memory;
mod postgres;

use std::sync::Arc;

use crawler_core::{CrawlResult, ResultId, Task, TaskId};

pub use memory::{MemoryStore, MemoryStoreFactory};
pub use postgres::{PgStore, PgStoreFactory};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("could not create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Shared durable state of all workers: the `url_queue` and `scraped_data`
/// tables.
///
/// Implementations must make `claim_next` an atomic select-and-remove that
/// skips rows a concurrent claimant holds instead of waiting on them.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// URLs of every persisted crawl result.
    async fn load_visited(&self) -> Result<Vec<String>, StoreError>;

    async fn save_result(&self, result: &CrawlResult) -> Result<ResultId, StoreError>;

    /// Duplicate rows are allowed; dedup happens before enqueueing.
    async fn enqueue(&self, url: &str) -> Result<TaskId, StoreError>;

    /// Removes and returns the oldest unclaimed task.
    async fn claim_next(&self) -> Result<Option<Task>, StoreError>;

    async fn remove_task(&self, id: TaskId) -> Result<(), StoreError>;
}

/// Opens the store handle of one worker. Each worker calls it once, so each
/// worker owns its own connections.
#[async_trait::async_trait]
pub trait StoreFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn Store>, StoreError>;
}
