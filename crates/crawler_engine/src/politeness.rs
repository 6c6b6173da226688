use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crawler_core::{ErrorContext, WorkerEvent};
use crawler_logging::{crawl_debug, crawl_warn};
use parking_lot::Mutex;
use url::Url;

use crate::{decode_html, EventSink, FetchError, Fetcher, RobotsRules};

#[derive(Debug, thiserror::Error)]
pub enum RobotsError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Cached robots.txt of one host.
#[derive(Debug, Clone)]
pub struct RobotsRecord {
    pub host: String,
    pub rules: Arc<RobotsRules>,
    pub fetched_at: Instant,
}

#[derive(Debug, Clone)]
pub struct PolitenessSettings {
    /// Delay when robots.txt declares none or cannot be fetched.
    pub default_delay: Duration,
    /// Zero disables caching: every query fetches robots.txt again.
    pub cache_ttl: Duration,
    /// Ceiling on a declared crawl delay.
    pub max_delay: Duration,
}

impl Default for PolitenessSettings {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_millis(200),
            cache_ttl: Duration::ZERO,
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Answers robots.txt allow/deny and crawl-delay questions for one worker.
///
/// Failures to fetch robots.txt fail open: the URL is allowed, the default
/// delay applies, and an error event is emitted.
pub struct PolitenessGate {
    fetcher: Arc<dyn Fetcher>,
    settings: PolitenessSettings,
    cache: Mutex<HashMap<String, RobotsRecord>>,
}

impl PolitenessGate {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: PolitenessSettings) -> Self {
        Self {
            fetcher,
            settings,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn is_allowed(&self, url: &str, user_agent: &str, sink: &dyn EventSink) -> bool {
        match self.rules_for(url, user_agent).await {
            Ok(rules) => rules.is_allowed(url, user_agent),
            Err(err) => {
                report(&err, sink);
                true
            }
        }
    }

    pub async fn crawl_delay(&self, url: &str, user_agent: &str, sink: &dyn EventSink) -> Duration {
        match self.rules_for(url, user_agent).await {
            Ok(rules) => rules
                .crawl_delay(user_agent)
                .map(|delay| delay.min(self.settings.max_delay))
                .unwrap_or(self.settings.default_delay),
            Err(err) => {
                report(&err, sink);
                self.settings.default_delay
            }
        }
    }

    /// Number of hosts currently cached.
    pub fn cached_hosts(&self) -> usize {
        self.cache.lock().len()
    }

    async fn rules_for(&self, url: &str, user_agent: &str) -> Result<Arc<RobotsRules>, RobotsError> {
        let parsed = Url::parse(url).map_err(|err| RobotsError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let host = parsed.origin().ascii_serialization();

        if let Some(rules) = self.cached(&host) {
            return Ok(rules);
        }

        let robots_url = parsed
            .join("/robots.txt")
            .map_err(|err| RobotsError::InvalidUrl {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        crawl_debug!("Fetching {}", robots_url);
        let output = self.fetcher.fetch(robots_url.as_str(), user_agent).await?;
        let body = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        let rules = Arc::new(RobotsRules::parse(&body.html));

        if !self.settings.cache_ttl.is_zero() {
            self.cache.lock().insert(
                host.clone(),
                RobotsRecord {
                    host,
                    rules: rules.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(rules)
    }

    fn cached(&self, host: &str) -> Option<Arc<RobotsRules>> {
        if self.settings.cache_ttl.is_zero() {
            return None;
        }
        let mut cache = self.cache.lock();
        match cache.get(host) {
            Some(record) if record.fetched_at.elapsed() < self.settings.cache_ttl => {
                Some(record.rules.clone())
            }
            Some(_) => {
                cache.remove(host);
                None
            }
            None => None,
        }
    }
}

fn report(err: &RobotsError, sink: &dyn EventSink) {
    crawl_warn!("robots.txt unavailable, allowing: {}", err);
    sink.emit(WorkerEvent::error(ErrorContext::Robots, err.to_string()));
}
