use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crawler_core::SchedulerView;
use crawler_logging::{clear_worker_tag, crawl_error, crawl_info, set_worker_tag};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    ChannelEventSink, StoreFactory, SupervisorEvent, Worker, WorkerConfig, WorkerExit, WorkerId,
};

/// Runs N independent workers, one OS thread and one single-threaded runtime
/// each. Workers share nothing but the store the factory opens for them.
pub struct Supervisor {
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<SupervisorEvent>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl Supervisor {
    pub fn spawn(count: usize, config: WorkerConfig, factory: Arc<dyn StoreFactory>) -> Self {
        let cancel = CancellationToken::new();
        let (tx, events) = mpsc::unbounded_channel();
        let mut threads = Vec::with_capacity(count);

        for worker in 1..=count {
            let config = config.clone();
            let factory = factory.clone();
            let cancel = cancel.clone();
            let thread_tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("crawl-worker-{worker}"))
                .spawn(move || run_worker_thread(worker, config, factory, cancel, thread_tx));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(err) => {
                    crawl_error!("Could not start worker {}: {}", worker, err);
                    let _ = tx.send(SupervisorEvent::Exited {
                        worker,
                        exit: WorkerExit::Abnormal {
                            code: 1,
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }
        crawl_info!("Started {} workers", threads.len());

        Self {
            cancel,
            events,
            threads,
        }
    }

    /// Next status line or exit notice. `None` once every worker has exited.
    pub async fn next_event(&mut self) -> Option<SupervisorEvent> {
        self.events.recv().await
    }

    /// Asks every worker to stop claiming and drain.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Blocks until every worker thread has ended.
    pub fn join(self) {
        for handle in self.threads {
            let _ = handle.join();
        }
    }
}

fn run_worker_thread(
    worker: WorkerId,
    config: WorkerConfig,
    factory: Arc<dyn StoreFactory>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
) {
    set_worker_tag(worker);
    let sink = Arc::new(ChannelEventSink::new(worker, tx.clone()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<SchedulerView, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| err.to_string())?;
        runtime.block_on(async {
            let store = factory.open().await.map_err(|err| err.to_string())?;
            Ok(Worker::new(store, &config, sink).run(cancel).await)
        })
    }));

    let exit = match outcome {
        Ok(Ok(view)) => {
            crawl_info!("Worker {} done after {} crawls", worker, view.crawled);
            WorkerExit::Normal
        }
        Ok(Err(reason)) => {
            crawl_error!("Worker {} failed: {}", worker, reason);
            WorkerExit::Abnormal { code: 1, reason }
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            crawl_error!("Worker {} panicked: {}", worker, reason);
            WorkerExit::Abnormal { code: 1, reason }
        }
    };
    let _ = tx.send(SupervisorEvent::Exited { worker, exit });
    clear_worker_tag();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
