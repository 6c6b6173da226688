use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{CrawlerConfig, StoreKind};
use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "crawler", version, about = "Polite, rate-limited distributed web crawler")]
pub struct Cli {
    /// RON settings file; flags override its values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreKind>,

    #[arg(long, global = true, value_enum, default_value = "file")]
    pub log: LogDestination,

    /// More diagnostics in the log.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the workers and crawl until interrupted.
    Run(RunArgs),
    /// Add URLs to the queue and exit.
    Seed {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Create the queue and result tables.
    InitDb,
}

#[derive(Debug, Args, Default)]
pub struct RunArgs {
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub max_in_flight: Option<usize>,

    #[arg(long = "max-rps")]
    pub max_requests_per_second: Option<u32>,

    /// URL to enqueue before starting. May be repeated.
    #[arg(long = "seed")]
    pub seeds: Vec<String>,
}

impl Cli {
    /// Applies flags on top of the file settings.
    pub fn apply(&self, config: &mut CrawlerConfig) {
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        if let Command::Run(args) = &self.command {
            if let Some(workers) = args.workers {
                config.workers = workers;
            }
            if let Some(max_in_flight) = args.max_in_flight {
                config.max_in_flight = max_in_flight;
            }
            if let Some(rps) = args.max_requests_per_second {
                config.max_requests_per_second = rps;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "crawler",
            "--store",
            "memory",
            "run",
            "--workers",
            "3",
            "--max-rps",
            "2",
            "--seed",
            "https://a.test/",
            "--seed",
            "https://b.test/",
        ])
        .unwrap();

        let mut config = CrawlerConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.workers, 3);
        assert_eq!(config.max_requests_per_second, 2);
        assert_eq!(config.max_in_flight, 5);
        assert_eq!(config.store, StoreKind::Memory);

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seeds, vec!["https://a.test/", "https://b.test/"]);
    }

    #[test]
    fn seed_needs_at_least_one_url() {
        assert!(Cli::try_parse_from(["crawler", "seed"]).is_err());
        let cli = Cli::try_parse_from(["crawler", "seed", "https://a.test/"]).unwrap();
        assert!(matches!(cli.command, Command::Seed { ref urls } if urls.len() == 1));
    }

    #[test]
    fn log_destination_defaults_to_file() {
        let cli = Cli::try_parse_from(["crawler", "init-db"]).unwrap();
        assert_eq!(cli.log, LogDestination::File);
        assert!(matches!(cli.command, Command::InitDb));
    }
}
