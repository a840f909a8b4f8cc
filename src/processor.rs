//! Search processor: one query through fetch → identify → check-seen →
//! notify → record-seen.

use metrics::counter;
use serde::Serialize;

use crate::ingest::{
    self,
    types::{FeedSource, FetchOutcome, SearchQuery},
};
use crate::notify::{Delivery, Notifier};
use crate::store::{MarkOutcome, SeenStore};

/// What happened for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub keywords: String,
    pub location: String,
    pub fetched: usize,
    pub already_seen: usize,
    /// New notifications delivered (and recorded).
    pub sent: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl SearchReport {
    fn for_query(query: &SearchQuery) -> Self {
        Self {
            keywords: query.keywords.clone(),
            location: query.location.clone(),
            ..Self::default()
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Sent {} new job notifications for {} in {}",
            self.sent, self.keywords, self.location
        )
    }
}

pub struct SearchProcessor<'a> {
    feed: &'a dyn FeedSource,
    store: &'a SeenStore,
    notifier: &'a dyn Notifier,
}

impl<'a> SearchProcessor<'a> {
    pub fn new(feed: &'a dyn FeedSource, store: &'a SeenStore, notifier: &'a dyn Notifier) -> Self {
        Self {
            feed,
            store,
            notifier,
        }
    }

    /// Listings are handled strictly in feed order, one at a time: the
    /// check-seen/mark-seen pair for an identifier must not interleave.
    pub async fn process(&self, query: &SearchQuery) -> SearchReport {
        let mut report = SearchReport::for_query(query);
        tracing::info!(keywords = %query.keywords, location = %query.location, "searching");

        let listings = match ingest::fetch(self.feed, query).await {
            FetchOutcome::Fetched(v) => v,
            FetchOutcome::Failed(e) => {
                report.fetch_error = Some(e);
                return report;
            }
        };
        report.fetched = listings.len();

        for listing in &listings {
            let listing_id = listing.identifier();

            if self.store.has_seen(&listing_id).await {
                report.already_seen += 1;
                counter!("listings_skipped_seen_total").increment(1);
                continue;
            }

            match self.notifier.notify(listing, &query.destination).await {
                Delivery::Delivered => {
                    if let MarkOutcome::Failed(e) = self.store.mark_seen(&listing_id).await {
                        tracing::debug!(%listing_id, error = %e, "delivered but not recorded");
                    }
                    report.sent += 1;
                }
                Delivery::NoDestination | Delivery::Failed(_) => {
                    // stays unseen; next run retries it
                    report.failed += 1;
                }
            }
        }

        report
    }
}
