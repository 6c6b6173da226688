use std::sync::Arc;
use std::time::Instant;

use crawler_core::{CrawlResult, DispatchOutcome, ErrorContext, Task, WorkerEvent};
use crawler_logging::{crawl_info, crawl_warn};
use url::Url;

use crate::{decode_html, EventSink, Extractor, Fetcher, Frontier, PolitenessGate, UserAgentPool};

/// Fetch, extract, persist and link discovery for one claimed task.
///
/// Nothing here is retried: a failed fetch drops the task, and a failed save
/// still leaves the URL marked visited.
pub struct FetchPipeline {
    frontier: Frontier,
    gate: Arc<PolitenessGate>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    agents: UserAgentPool,
}

impl FetchPipeline {
    pub fn new(
        frontier: Frontier,
        gate: Arc<PolitenessGate>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        agents: UserAgentPool,
    ) -> Self {
        Self {
            frontier,
            gate,
            fetcher,
            extractor,
            agents,
        }
    }

    pub async fn run(&self, task: &Task, sink: &dyn EventSink) -> DispatchOutcome {
        let url = task.url.as_str();

        if !self.gate.is_allowed(url, self.agents.pick(), sink).await {
            sink.emit(WorkerEvent::Blocked {
                url: url.to_string(),
            });
            return DispatchOutcome::Blocked;
        }

        if self.frontier.ledger().lock().is_visited(url) {
            return DispatchOutcome::Skipped;
        }

        sink.emit(WorkerEvent::Visiting {
            url: url.to_string(),
        });

        let base_url = match Url::parse(url) {
            Ok(base_url) => base_url,
            Err(err) => {
                sink.emit(WorkerEvent::error(ErrorContext::Fetch, err.to_string()));
                return DispatchOutcome::Failed;
            }
        };

        let agent = self.agents.pick();
        let started = Instant::now();
        let output = match self.fetcher.fetch(url, agent).await {
            Ok(output) => output,
            Err(err) => {
                sink.emit(WorkerEvent::error(ErrorContext::Fetch, err.to_string()));
                return DispatchOutcome::Failed;
            }
        };
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.had_errors {
            crawl_warn!("{} is not valid {}", url, decoded.encoding_label);
            sink.emit(WorkerEvent::warning(format!(
                "Malformed {} in {url}, replaced invalid bytes",
                decoded.encoding_label
            )));
        }

        let page = self.extractor.extract(&decoded.html, &base_url);
        let result = CrawlResult::new(page, url, response_time_ms);

        {
            let mut ledger = self.frontier.ledger().lock();
            ledger.mark_visited(url);
            // A redirect target holds the same content; never queue it.
            if output.metadata.final_url != url {
                ledger.mark_visited(&output.metadata.final_url);
            }
        }
        let outcome = match self.frontier.store().save_result(&result).await {
            Ok(id) => {
                crawl_info!("Saved {} as result {:?} in {} ms", url, id, response_time_ms);
                sink.emit(WorkerEvent::Added {
                    url: url.to_string(),
                });
                DispatchOutcome::Crawled
            }
            Err(err) => {
                sink.emit(WorkerEvent::error(ErrorContext::Persist, err.to_string()));
                DispatchOutcome::Failed
            }
        };

        for link in &result.links {
            self.frontier.offer(link, sink).await;
        }

        outcome
    }
}
