use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crawler_core::{DispatchOutcome, ErrorContext, EventKind, Ledger, Task, TaskId, WorkerEvent};
use crawler_engine::{
    FetchPipeline, FetchSettings, Frontier, MemoryStore, MetadataExtractor, PolitenessGate,
    PolitenessSettings, RecordingSink, ReqwestFetcher, Store, StoreError, UserAgentPool,
};
use parking_lot::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task(url: &str) -> Task {
    Task {
        id: TaskId(1),
        url: url.to_string(),
        created_at: Utc::now(),
    }
}

fn pipeline(store: Arc<dyn Store>) -> (FetchPipeline, Frontier) {
    let frontier = Frontier::new(store, Arc::new(Mutex::new(Ledger::new())));
    let gate = PolitenessGate::new(
        Arc::new(ReqwestFetcher::new(FetchSettings::for_robots())),
        PolitenessSettings {
            default_delay: Duration::from_millis(10),
            cache_ttl: Duration::ZERO,
            ..PolitenessSettings::default()
        },
    );
    let pipeline = FetchPipeline::new(
        frontier.clone(),
        Arc::new(gate),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        Arc::new(MetadataExtractor),
        UserAgentPool::default(),
    );
    (pipeline, frontier)
}

async fn serve(server: &MockServer, at: &str, body: String, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

fn kinds(events: &[WorkerEvent]) -> Vec<EventKind> {
    events.iter().map(WorkerEvent::kind).collect()
}

#[tokio::test]
async fn robots_denial_blocks_without_fetching() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\nDisallow: /\n".to_string(), "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let sink = RecordingSink::new();
    let url = format!("{}/", server.uri());

    let outcome = pipeline.run(&task(&url), &sink).await;

    assert_eq!(outcome, DispatchOutcome::Blocked);
    assert_eq!(kinds(&sink.take()), vec![EventKind::Blocked]);
    assert!(!frontier.ledger().lock().is_visited(&url));
    assert!(store.results().is_empty());
}

#[tokio::test]
async fn self_link_is_not_requeued() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\nAllow: /\n".to_string(), "text/plain").await;
    let home = format!("{}/", server.uri());
    let body = format!(
        r#"<html><head><title>B</title></head><body>
        <a href="http://c.test/">c</a>
        <a href="{home}">self</a>
        </body></html>"#
    );
    serve(&server, "/", body, "text/html; charset=utf-8").await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let sink = RecordingSink::new();

    let outcome = pipeline.run(&task(&home), &sink).await;

    assert_eq!(outcome, DispatchOutcome::Crawled);
    assert_eq!(store.queued_urls(), vec!["http://c.test/".to_string()]);
    assert!(frontier.ledger().lock().is_visited(&home));
    assert_eq!(
        kinds(&sink.take()),
        vec![EventKind::Visiting, EventKind::Added]
    );

    let results = store.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, home);
    assert_eq!(results[0].name, "B");
    assert_eq!(results[0].links.len(), 2);
}

#[tokio::test]
async fn links_already_queued_locally_are_not_enqueued_twice() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    let body = r#"<a href="http://c.test/">c</a>"#.to_string();
    serve(&server, "/one", body.clone(), "text/html").await;
    serve(&server, "/two", body, "text/html").await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, _frontier) = pipeline(store.clone());
    let sink = RecordingSink::new();

    pipeline.run(&task(&format!("{}/one", server.uri())), &sink).await;
    pipeline.run(&task(&format!("{}/two", server.uri())), &sink).await;

    assert_eq!(store.queued_urls(), vec!["http://c.test/".to_string()]);
}

#[tokio::test]
async fn visited_url_is_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/seen"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let url = format!("{}/seen", server.uri());
    frontier.ledger().lock().hydrate([url.as_str()]);
    let sink = RecordingSink::new();

    assert_eq!(pipeline.run(&task(&url), &sink).await, DispatchOutcome::Skipped);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn fetch_failure_drops_the_task() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let url = format!("{}/gone", server.uri());
    let sink = RecordingSink::new();

    assert_eq!(pipeline.run(&task(&url), &sink).await, DispatchOutcome::Failed);
    let events = sink.take();
    assert!(matches!(
        events.last(),
        Some(WorkerEvent::Error {
            context: ErrorContext::Fetch,
            ..
        })
    ));
    assert!(!frontier.ledger().lock().is_visited(&url));
    assert!(store.queued_urls().is_empty());
    assert!(store.results().is_empty());
}

/// Accepts everything except result writes.
struct ReadOnlyStore(MemoryStore);

#[async_trait::async_trait]
impl Store for ReadOnlyStore {
    async fn load_visited(&self) -> Result<Vec<String>, StoreError> {
        self.0.load_visited().await
    }

    async fn save_result(
        &self,
        _result: &crawler_core::CrawlResult,
    ) -> Result<crawler_core::ResultId, StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    async fn enqueue(&self, url: &str) -> Result<TaskId, StoreError> {
        self.0.enqueue(url).await
    }

    async fn claim_next(&self) -> Result<Option<Task>, StoreError> {
        self.0.claim_next().await
    }

    async fn remove_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.0.remove_task(id).await
    }
}

#[tokio::test]
async fn persistence_failure_still_marks_visited() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    serve(
        &server,
        "/page",
        r#"<a href="http://next.test/">n</a>"#.to_string(),
        "text/html",
    )
    .await;

    let store = Arc::new(ReadOnlyStore(MemoryStore::new()));
    let (pipeline, frontier) = pipeline(store.clone());
    let url = format!("{}/page", server.uri());
    let sink = RecordingSink::new();

    assert_eq!(pipeline.run(&task(&url), &sink).await, DispatchOutcome::Failed);
    assert!(frontier.ledger().lock().is_visited(&url));
    assert!(sink.take().iter().any(|event| matches!(
        event,
        WorkerEvent::Error {
            context: ErrorContext::Persist,
            ..
        }
    )));
    assert_eq!(store.0.queued_urls(), vec!["http://next.test/".to_string()]);
}

#[tokio::test]
async fn redirect_target_counts_as_visited() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    let new = format!("{}/new", server.uri());
    let body = format!(r#"<a href="{new}">here</a><a href="http://c.test/">c</a>"#);
    serve(&server, "/new", body, "text/html").await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let old = format!("{}/old", server.uri());
    let sink = RecordingSink::new();

    assert_eq!(pipeline.run(&task(&old), &sink).await, DispatchOutcome::Crawled);
    assert!(frontier.ledger().lock().is_visited(&old));
    assert!(frontier.ledger().lock().is_visited(&new));
    assert_eq!(store.queued_urls(), vec!["http://c.test/".to_string()]);
    assert_eq!(store.results()[0].url, old);
}

#[tokio::test]
async fn malformed_bytes_warn_but_page_is_saved() {
    let server = MockServer::start().await;
    serve(&server, "/robots.txt", "User-agent: *\n".to_string(), "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<title>caf\xff</title><p>still here</p>".to_vec(),
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let (pipeline, frontier) = pipeline(store.clone());
    let url = format!("{}/broken", server.uri());
    let sink = RecordingSink::new();

    assert_eq!(pipeline.run(&task(&url), &sink).await, DispatchOutcome::Crawled);
    assert_eq!(
        kinds(&sink.take()),
        vec![EventKind::Visiting, EventKind::Warning, EventKind::Added]
    );
    assert!(frontier.ledger().lock().is_visited(&url));

    let results = store.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "caf\u{FFFD}");
    assert_eq!(results[0].text, vec!["still here".to_string()]);
}
