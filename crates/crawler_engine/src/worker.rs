use std::sync::Arc;

use crawler_core::{
    update, DispatchOutcome, Effect, ErrorContext, Ledger, Msg, SchedulerSettings, SchedulerState,
    SchedulerView, WorkerEvent,
};
use crawler_logging::{crawl_debug, crawl_error, crawl_info};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    EventSink, Extractor, FetchPipeline, FetchSettings, Fetcher, Frontier, MetadataExtractor,
    PolitenessGate, PolitenessSettings, ReqwestFetcher, Store, UserAgentPool,
};

/// Everything one worker needs besides its store.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub scheduler: SchedulerSettings,
    pub fetch: FetchSettings,
    pub robots_fetch: FetchSettings,
    pub politeness: PolitenessSettings,
    pub user_agents: UserAgentPool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let scheduler = SchedulerSettings::default();
        Self {
            politeness: PolitenessSettings {
                default_delay: scheduler.default_delay,
                ..PolitenessSettings::default()
            },
            scheduler,
            fetch: FetchSettings::default(),
            robots_fetch: FetchSettings::for_robots(),
            user_agents: UserAgentPool::default(),
        }
    }
}

/// One cooperative scheduling loop: claims from the frontier, paces by crawl
/// delay and dispatches fetches without waiting on any single one of them.
///
/// All IO runs in spawned tasks that report back as [`Msg`]s; the loop itself
/// only ever applies [`update`] and turns effects into tasks.
pub struct Worker {
    frontier: Frontier,
    gate: Arc<PolitenessGate>,
    pipeline: Arc<FetchPipeline>,
    agents: UserAgentPool,
    settings: SchedulerSettings,
    sink: Arc<dyn EventSink>,
}

impl Worker {
    pub fn new(store: Arc<dyn Store>, config: &WorkerConfig, sink: Arc<dyn EventSink>) -> Self {
        let page_fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        let robots_fetcher: Arc<dyn Fetcher> =
            Arc::new(ReqwestFetcher::new(config.robots_fetch.clone()));
        Self::with_parts(
            store,
            config,
            page_fetcher,
            robots_fetcher,
            Arc::new(MetadataExtractor),
            sink,
        )
    }

    pub fn with_parts(
        store: Arc<dyn Store>,
        config: &WorkerConfig,
        page_fetcher: Arc<dyn Fetcher>,
        robots_fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let frontier = Frontier::new(store, Arc::new(Mutex::new(Ledger::new())));
        let gate = Arc::new(PolitenessGate::new(robots_fetcher, config.politeness.clone()));
        let pipeline = Arc::new(FetchPipeline::new(
            frontier.clone(),
            gate.clone(),
            page_fetcher,
            extractor,
            config.user_agents.clone(),
        ));
        Self {
            frontier,
            gate,
            pipeline,
            agents: config.user_agents.clone(),
            settings: config.scheduler.clone(),
            sink,
        }
    }

    /// Runs until `cancel` fires and every in-flight fetch has finished.
    pub async fn run(self, cancel: CancellationToken) -> SchedulerView {
        let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
        let mut state = SchedulerState::new(self.settings.clone());

        self.spawn_load(tx.clone());

        let mut cancelled = false;
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    crawl_info!("Shutdown requested, draining");
                    Msg::Shutdown
                }
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                self.apply(effect, &tx);
            }
            if state.is_finished() {
                break;
            }
        }

        let view = state.view();
        crawl_info!(
            "Worker stopped: crawled={} blocked={} skipped={} failed={}",
            view.crawled,
            view.blocked,
            view.skipped,
            view.failed
        );
        view
    }

    fn spawn_load(&self, tx: mpsc::UnboundedSender<Msg>) {
        let frontier = self.frontier.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let count = match frontier.load_visited().await {
                Ok(count) => {
                    sink.emit(WorkerEvent::Loaded { count });
                    count
                }
                Err(err) => {
                    // The barrier still opens; this worker just starts
                    // without history.
                    crawl_error!("Loading visited URLs failed: {}", err);
                    sink.emit(WorkerEvent::error(ErrorContext::LoadVisited, err.to_string()));
                    0
                }
            };
            let _ = tx.send(Msg::VisitedLoaded { count });
        });
    }

    fn apply(&self, effect: Effect, tx: &mpsc::UnboundedSender<Msg>) {
        let tx = tx.clone();
        match effect {
            Effect::ScheduleTick { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Msg::Tick);
                });
            }
            Effect::ClaimNext => {
                let frontier = self.frontier.clone();
                tokio::spawn(async move {
                    let claim = tokio::spawn(async move { frontier.claim_next().await });
                    // A claim that dies still has to hand its slot back.
                    let msg = match claim.await {
                        Ok(Ok(Some(task))) => Msg::Claimed(task),
                        Ok(Ok(None)) => Msg::QueueEmpty,
                        Ok(Err(err)) => Msg::ClaimFailed {
                            reason: err.to_string(),
                        },
                        Err(err) => {
                            crawl_error!("Claim aborted: {}", err);
                            Msg::ClaimFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::ResolveDelay { task } => {
                let gate = self.gate.clone();
                let sink = self.sink.clone();
                let agent = self.agents.pick().to_string();
                let default_delay = self.settings.default_delay;
                let task_id = task.id;
                tokio::spawn(async move {
                    let lookup_sink = sink.clone();
                    let lookup = tokio::spawn(async move {
                        let delay = gate
                            .crawl_delay(&task.url, &agent, lookup_sink.as_ref())
                            .await;
                        crawl_debug!("Crawl delay for {} is {:?}", task.url, delay);
                        delay
                    });
                    let delay = match lookup.await {
                        Ok(delay) => delay,
                        Err(err) => {
                            crawl_error!("Crawl delay lookup for task {} aborted: {}", task_id, err);
                            sink.emit(WorkerEvent::error(ErrorContext::Robots, err.to_string()));
                            default_delay
                        }
                    };
                    let _ = tx.send(Msg::DelayResolved { task_id, delay });
                });
            }
            Effect::Dispatch { task } => {
                let pipeline = self.pipeline.clone();
                let sink = self.sink.clone();
                let task_id = task.id;
                tokio::spawn(async move {
                    let run_sink = sink.clone();
                    let fetch =
                        tokio::spawn(async move { pipeline.run(&task, run_sink.as_ref()).await });
                    // Whatever happens to the fetch, the slot comes back.
                    let outcome = match fetch.await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            crawl_error!("Task {} aborted: {}", task_id, err);
                            sink.emit(WorkerEvent::error(ErrorContext::Fetch, err.to_string()));
                            DispatchOutcome::Failed
                        }
                    };
                    let _ = tx.send(Msg::FetchFinished { task_id, outcome });
                });
            }
            Effect::Emit(event) => self.sink.emit(event),
        }
    }
}
