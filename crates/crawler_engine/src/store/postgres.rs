use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawler_core::{CrawlResult, ResultId, Task, TaskId};
use crawler_logging::{crawl_debug, crawl_info};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::types::Json;
use tokio_postgres::NoTls;

use super::{Store, StoreError, StoreFactory};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS scraped_data (
    id            BIGSERIAL PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    icons         JSONB NOT NULL,
    opengraph     JSONB NOT NULL,
    url           TEXT NOT NULL,
    canonical     TEXT,
    alternates    JSONB NOT NULL,
    links         JSONB NOT NULL,
    text          JSONB NOT NULL,
    images        JSONB NOT NULL,
    response_time BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS url_queue (
    id         BIGSERIAL PRIMARY KEY,
    url        TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS url_queue_created_at_idx ON url_queue (created_at, id);
";

const CLAIM: &str = "SELECT id, url, created_at FROM url_queue \
                     ORDER BY created_at, id LIMIT 1 FOR UPDATE SKIP LOCKED";

/// Postgres-backed store. Every call checks a client out of the pool; the
/// pool guard returns it on every exit path.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn connect(database_url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let mut config = Config::new();
        config.url = Some(database_url.to_string());
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        config.pool = Some(PoolConfig::new(pool_size.max(1)));
        let pool = config.create_pool(Some(Runtime::Tokio1), NoTls)?;
        Ok(Self { pool })
    }

    /// Creates both tables and the queue index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        crawl_info!("Database schema ready");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn load_visited(&self) -> Result<Vec<String>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client.query("SELECT url FROM scraped_data", &[]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(StoreError::from))
            .collect()
    }

    async fn save_result(&self, result: &CrawlResult) -> Result<ResultId, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO scraped_data (name, description, icons, opengraph, url, canonical, \
                 alternates, links, text, images, response_time) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
                &[
                    &result.name,
                    &result.description,
                    &Json(&result.icons),
                    &Json(&result.open_graph),
                    &result.url,
                    &result.canonical,
                    &Json(&result.alternates),
                    &Json(&result.links),
                    &Json(&result.text),
                    &Json(&result.images),
                    &i64::try_from(result.response_time_ms).unwrap_or(i64::MAX),
                ],
            )
            .await?;
        Ok(ResultId(row.try_get(0)?))
    }

    async fn enqueue(&self, url: &str) -> Result<TaskId, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("INSERT INTO url_queue (url) VALUES ($1) RETURNING id", &[&url])
            .await?;
        Ok(TaskId(row.try_get(0)?))
    }

    async fn claim_next(&self) -> Result<Option<Task>, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let Some(row) = tx.query_opt(CLAIM, &[]).await? else {
            tx.commit().await?;
            return Ok(None);
        };
        let task = Task {
            id: TaskId(row.try_get(0)?),
            url: row.try_get(1)?,
            created_at: row.try_get::<_, DateTime<Utc>>(2)?,
        };
        tx.execute("DELETE FROM url_queue WHERE id = $1", &[&task.id.0])
            .await?;
        // Dropping an uncommitted transaction rolls it back, so the row
        // survives any error above.
        tx.commit().await?;
        crawl_debug!("Claimed task {} ({})", task.id, task.url);
        Ok(Some(task))
    }

    async fn remove_task(&self, id: TaskId) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM url_queue WHERE id = $1", &[&id.0])
            .await?;
        Ok(())
    }
}

/// Opens a separate pool per worker.
#[derive(Debug, Clone)]
pub struct PgStoreFactory {
    database_url: String,
    pool_size: usize,
}

impl PgStoreFactory {
    pub fn new(database_url: impl Into<String>, pool_size: usize) -> Self {
        Self {
            database_url: database_url.into(),
            pool_size,
        }
    }
}

#[async_trait::async_trait]
impl StoreFactory for PgStoreFactory {
    async fn open(&self) -> Result<Arc<dyn Store>, StoreError> {
        Ok(Arc::new(PgStore::connect(&self.database_url, self.pool_size)?))
    }
}
