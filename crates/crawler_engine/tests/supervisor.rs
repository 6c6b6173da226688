use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crawler_core::{SchedulerSettings, WorkerEvent};
use crawler_engine::{
    MemoryStore, MemoryStoreFactory, PolitenessSettings, Store, StoreError, StoreFactory,
    Supervisor, SupervisorEvent, WorkerConfig, WorkerExit,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> WorkerConfig {
    let scheduler = SchedulerSettings {
        max_in_flight: 1,
        poll_interval: Duration::from_millis(10),
        default_delay: Duration::from_millis(10),
    };
    WorkerConfig {
        politeness: PolitenessSettings {
            default_delay: scheduler.default_delay,
            cache_ttl: Duration::ZERO,
            ..PolitenessSettings::default()
        },
        scheduler,
        ..WorkerConfig::default()
    }
}

async fn next(supervisor: &mut Supervisor) -> Option<SupervisorEvent> {
    tokio::time::timeout(Duration::from_secs(10), supervisor.next_event())
        .await
        .expect("supervisor event in time")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_workers_share_one_queue_without_double_crawling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/only"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<title>only</title>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/only", server.uri());
    let store = Arc::new(MemoryStore::with_queue([url.as_str()]));
    let factory = Arc::new(MemoryStoreFactory::new(store.clone()));
    let mut supervisor = Supervisor::spawn(2, fast_config(), factory);

    let mut added = Vec::new();
    let mut tagged = HashSet::new();
    while added.is_empty() {
        match next(&mut supervisor).await {
            Some(SupervisorEvent::Worker { worker, event }) => {
                tagged.insert(worker);
                if let WorkerEvent::Added { url } = event {
                    added.push((worker, url));
                }
            }
            Some(SupervisorEvent::Exited { worker, exit }) => {
                panic!("worker {worker} exited early: {exit}")
            }
            None => panic!("event channel closed"),
        }
    }
    // Let the other worker poll a few more ticks before stopping.
    tokio::time::sleep(Duration::from_millis(100)).await;
    supervisor.shutdown();

    let mut exits = Vec::new();
    while let Some(event) = next(&mut supervisor).await {
        match event {
            SupervisorEvent::Exited { worker, exit } => exits.push((worker, exit)),
            SupervisorEvent::Worker { worker, event } => {
                tagged.insert(worker);
                assert!(!matches!(event, WorkerEvent::Added { .. }));
            }
        }
    }
    supervisor.join();

    assert_eq!(added.len(), 1);
    assert_eq!(added[0].1, url);
    assert!(tagged.iter().all(|worker| *worker == 1 || *worker == 2));
    exits.sort_by_key(|(worker, _)| *worker);
    assert_eq!(
        exits,
        vec![(1, WorkerExit::Normal), (2, WorkerExit::Normal)]
    );
    assert_eq!(store.results().len(), 1);
}

struct UnreachableFactory;

#[async_trait::async_trait]
impl StoreFactory for UnreachableFactory {
    async fn open(&self) -> Result<Arc<dyn Store>, StoreError> {
        Err(StoreError::Unavailable("no database".to_string()))
    }
}

#[tokio::test]
async fn store_failure_is_an_abnormal_exit() {
    let mut supervisor = Supervisor::spawn(1, fast_config(), Arc::new(UnreachableFactory));

    let event = next(&mut supervisor).await;
    match event {
        Some(SupervisorEvent::Exited { worker, exit }) => {
            assert_eq!(worker, 1);
            assert_eq!(exit.code(), 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(next(&mut supervisor).await, None);
    supervisor.join();
}
