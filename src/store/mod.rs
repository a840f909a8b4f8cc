//! Seen-store: which listing identifiers have already been announced.
//!
//! [`SeenStore`] is the client the pipeline talks to. It wraps a fallible
//! [`SeenBackend`] and fails open: when the backend is unreachable a listing
//! reads as unseen (risking a duplicate, never a lost notification) and writes
//! become no-ops.

pub mod file;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

pub use file::FileBackend;
pub use memory::MemoryBackend;

pub const DEFAULT_TTL_DAYS: i64 = 30;

/// Durable marker for an announced listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub listing_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Unix seconds; backends drop the record after this instant.
    pub expires_at: i64,
}

impl SeenRecord {
    pub fn new(listing_id: &str, recorded_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            listing_id: listing_id.to_string(),
            recorded_at,
            expires_at: (recorded_at + ttl).timestamp(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

#[async_trait::async_trait]
pub trait SeenBackend: Send + Sync {
    /// Availability check, run once per run.
    async fn probe(&self) -> Result<()>;
    async fn get(&self, listing_id: &str) -> Result<Option<SeenRecord>>;
    async fn put(&self, record: &SeenRecord) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Outcome of a seen-store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Seen,
    Unseen,
    /// Store degraded for this run; backend not consulted.
    Unavailable,
    Failed(String),
}

/// Outcome of recording a listing as announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Recorded(SeenRecord),
    /// Store degraded for this run; nothing written.
    Skipped,
    Failed(String),
}

pub struct SeenStore {
    backend: Option<Arc<dyn SeenBackend>>,
    ttl: Duration,
}

impl SeenStore {
    /// Probe the backend once. A failed probe leaves the store degraded for
    /// the lifetime of this value.
    pub async fn connect(backend: Arc<dyn SeenBackend>) -> Self {
        crate::metrics::ensure_described();
        match backend.probe().await {
            Ok(()) => {
                tracing::debug!(backend = backend.name(), "seen-store ready");
                Self {
                    backend: Some(backend),
                    ttl: Duration::days(DEFAULT_TTL_DAYS),
                }
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    error = %format!("{e:#}"),
                    "seen-store unreachable; running without dedup"
                );
                counter!("seen_store_errors_total").increment(1);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn lookup(&self, listing_id: &str) -> Lookup {
        let Some(backend) = &self.backend else {
            return Lookup::Unavailable;
        };
        match backend.get(listing_id).await {
            Ok(Some(_)) => Lookup::Seen,
            Ok(None) => Lookup::Unseen,
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    listing_id,
                    error = %format!("{e:#}"),
                    "seen-store lookup failed; treating as unseen"
                );
                counter!("seen_store_errors_total").increment(1);
                Lookup::Failed(format!("{e:#}"))
            }
        }
    }

    /// `true` only when the backend positively knows the listing.
    pub async fn has_seen(&self, listing_id: &str) -> bool {
        self.lookup(listing_id).await == Lookup::Seen
    }

    pub async fn mark_seen(&self, listing_id: &str) -> MarkOutcome {
        let Some(backend) = &self.backend else {
            return MarkOutcome::Skipped;
        };
        let record = SeenRecord::new(listing_id, Utc::now(), self.ttl);
        match backend.put(&record).await {
            Ok(()) => MarkOutcome::Recorded(record),
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    listing_id,
                    error = %format!("{e:#}"),
                    "seen-store write failed; listing may be announced again"
                );
                counter!("seen_store_errors_total").increment(1);
                MarkOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}

/// Object key for backends that cannot take arbitrary strings as keys.
pub fn storage_key(listing_id: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(listing_id.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
