//! Crawler engine: fetching, politeness, extraction, storage and the worker
//! runtime that drives the core scheduler.
mod agents;
mod decode;
mod events;
mod extract;
mod fetch;
mod frontier;
mod pipeline;
mod politeness;
mod robots;
mod store;
mod supervisor;
mod types;
mod worker;

pub use agents::UserAgentPool;
pub use decode::{decode_html, DecodedHtml};
pub use events::{
    ChannelEventSink, EventSink, RecordingSink, SupervisorEvent, WorkerExit, WorkerId,
};
pub use extract::{Extractor, MetadataExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use frontier::Frontier;
pub use pipeline::FetchPipeline;
pub use politeness::{PolitenessGate, PolitenessSettings, RobotsError, RobotsRecord};
pub use robots::RobotsRules;
pub use store::{
    MemoryStore, MemoryStoreFactory, PgStore, PgStoreFactory, Store, StoreError, StoreFactory,
};
pub use supervisor::Supervisor;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
pub use worker::{Worker, WorkerConfig};
