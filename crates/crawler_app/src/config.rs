use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crawler_core::SchedulerSettings;
use crawler_engine::{FetchSettings, PolitenessSettings, UserAgentPool, WorkerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("the postgres store needs a database url (--database-url or DATABASE_URL)")]
    MissingDatabaseUrl,
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Crawler settings, read from an optional RON file and then overridden by
/// command-line flags. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub workers: usize,
    pub max_in_flight: usize,
    pub max_requests_per_second: u32,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    /// Zero refetches robots.txt for every query.
    pub robots_cache_ttl_secs: u64,
    /// Longer declared crawl delays are cut down to this.
    pub max_crawl_delay_secs: u64,
    /// Empty uses the built-in pool.
    pub user_agents: Vec<String>,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub pool_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            workers: 5,
            max_in_flight: 5,
            max_requests_per_second: 5,
            poll_interval_ms: 100,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_page_bytes: fetch.max_bytes,
            robots_cache_ttl_secs: 0,
            max_crawl_delay_secs: 60,
            user_agents: Vec::new(),
            store: StoreKind::Postgres,
            database_url: None,
            pool_size: 4,
        }
    }
}

impl CrawlerConfig {
    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Zero("max_in_flight"));
        }
        if self.max_requests_per_second == 0 {
            return Err(ConfigError::Zero("max_requests_per_second"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Zero("connect_timeout_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("request_timeout_secs"));
        }
        if self.store == StoreKind::Postgres && self.database_url().is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn worker_config(&self) -> WorkerConfig {
        let scheduler = SchedulerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..SchedulerSettings::from_requests_per_second(
                self.max_in_flight,
                self.max_requests_per_second,
            )
        };
        let fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_page_bytes,
            ..FetchSettings::default()
        };
        let robots_fetch = FetchSettings {
            connect_timeout: fetch.connect_timeout,
            request_timeout: fetch.request_timeout,
            ..FetchSettings::for_robots()
        };
        WorkerConfig {
            politeness: PolitenessSettings {
                default_delay: scheduler.default_delay,
                cache_ttl: Duration::from_secs(self.robots_cache_ttl_secs),
                max_delay: Duration::from_secs(self.max_crawl_delay_secs),
            },
            scheduler,
            fetch,
            robots_fetch,
            user_agents: UserAgentPool::new(self.user_agents.clone()),
        }
    }
}
