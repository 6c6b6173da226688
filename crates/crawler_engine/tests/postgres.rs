//! Runs only when `CRAWLER_TEST_DATABASE_URL` points at a scratch database.
use std::collections::HashSet;
use std::sync::Arc;

use crawler_core::{CrawlResult, ExtractedPage};
use crawler_engine::{PgStore, Store};

fn database_url() -> Option<String> {
    std::env::var("CRAWLER_TEST_DATABASE_URL").ok()
}

async fn drain(store: &PgStore) {
    while store.claim_next().await.unwrap().is_some() {}
}

/// The checks share two tables, so they run one after another.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn postgres_store_contract() {
    let Some(url) = database_url() else {
        return;
    };
    concurrent_claims_skip_locked_rows(&url).await;
    saved_results_are_visible_as_visited(&url).await;
    claims_follow_insertion_order(&url).await;
}

async fn concurrent_claims_skip_locked_rows(url: &str) {
    let store = PgStore::connect(url, 8).unwrap();
    store.ensure_schema().await.unwrap();
    drain(&store).await;

    for i in 0..50 {
        store.enqueue(&format!("http://pg.test/{i}")).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        // Each claimant owns its own pool, like a worker would.
        let store = Arc::new(PgStore::connect(url, 2).unwrap());
        handles.push(tokio::spawn(async move {
            let mut mine = Vec::new();
            while let Some(task) = store.claim_next().await.unwrap() {
                mine.push(task.url);
            }
            mine
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for url in handle.await.unwrap() {
            assert!(seen.insert(url.clone()), "{url} claimed twice");
        }
    }
    assert_eq!(seen.len(), 50);
}

async fn saved_results_are_visible_as_visited(url: &str) {
    let store = PgStore::connect(url, 2).unwrap();
    store.ensure_schema().await.unwrap();

    let page = ExtractedPage {
        name: "Stored".to_string(),
        links: vec!["http://next.test/".to_string()],
        ..ExtractedPage::default()
    };
    let crawled = format!(
        "http://stored.test/{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    store
        .save_result(&CrawlResult::new(page, crawled.as_str(), 17))
        .await
        .unwrap();

    let visited = store.load_visited().await.unwrap();
    assert!(visited.contains(&crawled));
}

async fn claims_follow_insertion_order(url: &str) {
    let store = PgStore::connect(url, 1).unwrap();
    store.ensure_schema().await.unwrap();
    drain(&store).await;

    let first = store.enqueue("http://first.test/").await.unwrap();
    let second = store.enqueue("http://second.test/").await.unwrap();
    store.remove_task(second).await.unwrap();

    let task = store.claim_next().await.unwrap().unwrap();
    assert_eq!(task.id, first);
    assert!(store.claim_next().await.unwrap().is_none());
}
