mod cli;
mod config;
mod console;
mod logging;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use crawler_engine::{
    MemoryStore, MemoryStoreFactory, PgStore, PgStoreFactory, Store, StoreFactory, Supervisor,
};
use crawler_logging::{crawl_info, crawl_warn};
use log::LevelFilter;
use url::Url;

use cli::{Cli, Command};
use config::{CrawlerConfig, StoreKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let mut config = CrawlerConfig::load(cli.config.as_deref()).context("loading settings")?;
    cli.apply(&mut config);
    config.validate()?;

    match &cli.command {
        Command::InitDb => {
            let store = connect(&config)?;
            store.ensure_schema().await.context("creating tables")?;
            println!("Tables ready.");
        }
        Command::Seed { urls } => {
            if config.store == StoreKind::Memory {
                bail!("seeding an in-memory store has no lasting effect; use `run --seed`");
            }
            let store = connect(&config)?;
            let added = seed(&store, urls).await?;
            println!("Added {added} URLs to the queue.");
        }
        Command::Run(args) => {
            let factory: Arc<dyn StoreFactory> = match config.store {
                StoreKind::Memory => {
                    let store = Arc::new(MemoryStore::new());
                    seed(store.as_ref(), &args.seeds).await?;
                    Arc::new(MemoryStoreFactory::new(store))
                }
                StoreKind::Postgres => {
                    if !args.seeds.is_empty() {
                        seed(&connect(&config)?, &args.seeds).await?;
                    }
                    Arc::new(PgStoreFactory::new(
                        config.database_url().unwrap_or_default(),
                        config.pool_size,
                    ))
                }
            };
            run(&config, factory).await;
        }
    }
    Ok(())
}

fn connect(config: &CrawlerConfig) -> anyhow::Result<PgStore> {
    let url = config
        .database_url()
        .context("no database url configured")?;
    PgStore::connect(url, config.pool_size).context("connecting to the database")
}

/// Enqueues every valid URL. Invalid ones are reported and skipped.
async fn seed(store: &dyn Store, urls: &[String]) -> anyhow::Result<usize> {
    let mut added = 0;
    for raw in urls {
        let url = raw.trim();
        if let Err(err) = Url::parse(url) {
            crawl_warn!("Skipping seed {}: {}", url, err);
            eprintln!("Skipping invalid URL '{url}': {err}");
            continue;
        }
        store
            .enqueue(url)
            .await
            .with_context(|| format!("adding '{url}' to the queue"))?;
        added += 1;
    }
    crawl_info!("Seeded {} of {} URLs", added, urls.len());
    Ok(added)
}

async fn run(config: &CrawlerConfig, factory: Arc<dyn StoreFactory>) {
    let mut supervisor = Supervisor::spawn(config.workers, config.worker_config(), factory);
    let cancel = supervisor.cancellation_token();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = supervisor.next_event() => match event {
                Some(event) => println!("{}", console::format_event(&event)),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                crawl_info!("Interrupted, draining workers");
                println!("Stopping workers...");
                cancel.cancel();
            }
        }
    }

    supervisor.join();
    crawl_info!("All workers stopped");
}
