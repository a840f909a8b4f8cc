pub mod discord;

use crate::ingest::types::Listing;

pub use discord::DiscordNotifier;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Endpoint acknowledged with 2xx.
    Delivered,
    /// No destination configured; nothing was sent.
    NoDestination,
    Failed(String),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, listing: &Listing, destination: &str) -> Delivery;
}
