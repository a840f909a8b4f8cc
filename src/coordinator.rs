//! Run coordinator: every configured search, one after another.

use std::sync::Arc;

use chrono::Duration;
use metrics::counter;
use serde::Serialize;

use crate::ingest::types::{FeedSource, SearchQuery};
use crate::notify::Notifier;
use crate::processor::{SearchProcessor, SearchReport};
use crate::store::{SeenBackend, SeenStore, DEFAULT_TTL_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub total: usize,
    pub searches: Vec<SearchReport>,
}

impl RunSummary {
    pub fn message(&self) -> String {
        format!("Successfully sent {} new job notifications", self.total)
    }

    pub fn into_response(self) -> TriggerResponse {
        TriggerResponse::ok(&self.message())
    }
}

/// What the periodic trigger gets back. Always 200: failures are absorbed
/// and only visible in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status_code: u16,
    /// JSON-encoded summary string.
    pub body: String,
}

impl TriggerResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            status_code: 200,
            body: serde_json::Value::String(message.to_string()).to_string(),
        }
    }
}

pub struct RunCoordinator {
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    backend: Option<Arc<dyn SeenBackend>>,
    ttl: Duration,
}

impl RunCoordinator {
    /// `backend = None` runs without dedup (every listing is announced).
    pub fn new(
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        backend: Option<Arc<dyn SeenBackend>>,
    ) -> Self {
        Self {
            feed,
            notifier,
            backend,
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn run(&self, queries: &[SearchQuery]) -> RunSummary {
        crate::metrics::ensure_described();

        let store = match &self.backend {
            Some(b) => SeenStore::connect(Arc::clone(b)).await,
            None => {
                tracing::warn!("no seen-store configured; running without dedup");
                SeenStore::disabled()
            }
        }
        .with_ttl(self.ttl);

        let processor = SearchProcessor::new(self.feed.as_ref(), &store, self.notifier.as_ref());

        let mut searches = Vec::with_capacity(queries.len());
        for query in queries {
            let report = processor.process(query).await;
            tracing::info!(
                keywords = %report.keywords,
                location = %report.location,
                fetched = report.fetched,
                already_seen = report.already_seen,
                failed = report.failed,
                "{}",
                report.summary_line()
            );
            searches.push(report);
        }

        let total = searches.iter().map(|r| r.sent).sum();
        counter!("runs_total").increment(1);

        RunSummary {
            status: RunStatus::Success,
            total,
            searches,
        }
    }
}
