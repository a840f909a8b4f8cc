// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One configured search, already resolved (destination included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    /// Webhook URL; empty means "not configured".
    pub destination: String,
}

impl SearchQuery {
    pub fn new(
        keywords: impl Into<String>,
        location: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            destination: destination.into(),
        }
    }
}

/// A job listing as parsed from the feed. Never persisted whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub url: String,
    pub source_name: String, // company / publisher
    pub description: String,
    pub location: String, // display form, capitalized
    pub published: String,
}

/// Separator between the identifier components. Existing seen-store keys use it.
pub const ID_SEPARATOR: &str = "-";

impl Listing {
    /// Dedup key: title, source and url joined by [`ID_SEPARATOR`].
    pub fn identifier(&self) -> String {
        listing_id(&self.title, &self.source_name, &self.url)
    }
}

pub fn listing_id(title: &str, source_name: &str, url: &str) -> String {
    [title, source_name, url].join(ID_SEPARATOR)
}

/// Result of one feed fetch, as seen by the search processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(Vec<Listing>),
    Failed(String),
}

impl FetchOutcome {
    pub fn into_listings(self) -> Vec<Listing> {
        match self {
            FetchOutcome::Fetched(v) => v,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Fetched(_) => None,
            FetchOutcome::Failed(e) => Some(e),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>>;
    fn name(&self) -> &'static str;
}
