// src/bootstrap.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{AppConfig, StoreKind, StoreSettings};
use crate::coordinator::{RunCoordinator, RunSummary};
use crate::ingest::providers::LinkedInRssSource;
use crate::ingest::types::SearchQuery;
use crate::notify::DiscordNotifier;
use crate::store::{FileBackend, MemoryBackend, SeenBackend};

/// Fully wired pipeline for one config.
pub struct Runtime {
    pub queries: Vec<SearchQuery>,
    pub coordinator: RunCoordinator,
}

impl Runtime {
    pub async fn from_config(cfg: &AppConfig) -> Result<Self> {
        let queries = cfg.queries();
        for q in queries.iter().filter(|q| q.destination.is_empty()) {
            warn!(
                keywords = %q.keywords,
                location = %q.location,
                "search has no webhook URL; its listings will not be announced"
            );
        }
        info!(
            searches = queries.len(),
            store = ?cfg.store.backend,
            pacing_ms = cfg.notifier.pacing_ms,
            "config loaded"
        );

        let feed = LinkedInRssSource::from_base_url(
            cfg.feed.base_url.clone(),
            Duration::from_secs(cfg.feed.timeout_secs),
        )?;
        let notifier = DiscordNotifier::new()
            .with_timeout(cfg.notifier.timeout_secs)
            .with_pacing(Duration::from_millis(cfg.notifier.pacing_ms))
            .with_max_description(cfg.notifier.max_description_chars)
            .with_footer(cfg.notifier.footer.clone());
        let backend = seen_backend(&cfg.store).await?;

        let coordinator = RunCoordinator::new(Arc::new(feed), Arc::new(notifier), backend)
            .with_ttl(chrono::Duration::days(cfg.store.ttl_days.max(1)));

        Ok(Self {
            queries,
            coordinator,
        })
    }

    pub async fn run_once(&self) -> RunSummary {
        self.coordinator.run(&self.queries).await
    }
}

/// Build the configured seen-store backend; `None` for `disabled`.
pub async fn seen_backend(settings: &StoreSettings) -> Result<Option<Arc<dyn SeenBackend>>> {
    let backend: Arc<dyn SeenBackend> = match settings.backend {
        StoreKind::Disabled => return Ok(None),
        StoreKind::Memory => Arc::new(MemoryBackend::new()),
        StoreKind::File => Arc::new(FileBackend::new(&settings.path)),
        StoreKind::S3 => s3_backend(settings).await?,
    };
    Ok(Some(backend))
}

#[cfg(feature = "s3")]
async fn s3_backend(settings: &StoreSettings) -> Result<Arc<dyn SeenBackend>> {
    use crate::store::s3::{S3Backend, DEFAULT_BUCKET, DEFAULT_PREFIX};

    let bucket = std::env::var(crate::config::app::ENV_S3_BUCKET)
        .ok()
        .or_else(|| settings.bucket.clone())
        .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
    let prefix = std::env::var("S3_PREFIX")
        .ok()
        .or_else(|| settings.prefix.clone())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    Ok(Arc::new(S3Backend::from_env(bucket, prefix).await))
}

#[cfg(not(feature = "s3"))]
async fn s3_backend(_settings: &StoreSettings) -> Result<Arc<dyn SeenBackend>> {
    anyhow::bail!("store backend `s3` requires building with feature `s3`")
}
