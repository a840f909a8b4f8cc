// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod processor;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::coordinator::{RunCoordinator, RunStatus, RunSummary, TriggerResponse};
pub use crate::ingest::types::{FeedSource, FetchOutcome, Listing, SearchQuery};
pub use crate::notify::{Delivery, DiscordNotifier, Notifier};
pub use crate::processor::{SearchProcessor, SearchReport};
pub use crate::store::{Lookup, MarkOutcome, SeenBackend, SeenRecord, SeenStore};

use tracing::info;

/// Load config (`$CONFIG_FILE` or fallback), run every search once and
/// return the trigger response. Never fails for pipeline errors; only
/// wiring errors (bad feed URL, missing `s3` feature) surface here.
pub async fn run_from_env() -> anyhow::Result<TriggerResponse> {
    let cfg = config::AppConfig::load_default();
    let runtime = bootstrap::Runtime::from_config(&cfg).await?;
    let summary = runtime.run_once().await;
    info!(total = summary.total, "run finished");
    Ok(summary.into_response())
}
