use super::{Delivery, Notifier};
use crate::ingest::types::Listing;
use crate::ingest::NO_DESCRIPTION;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const MAX_DESCRIPTION_CHARS: usize = 4000;
pub const DEFAULT_PACING_MS: u64 = 1000;
pub const DEFAULT_FOOTER: &str = "LinkedIn Job Alert";
/// LinkedIn blue.
pub const DEFAULT_COLOR: u32 = 0x0077B5;

// Discord embed limits
const MAX_TITLE_CHARS: usize = 256;
const MAX_FIELD_CHARS: usize = 1024;

#[derive(Clone)]
pub struct DiscordNotifier {
    client: Client,
    timeout: Duration,
    pacing: Duration,
    max_description: usize,
    footer: String,
    color: u32,
}

impl Default for DiscordNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscordNotifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(10),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            max_description: MAX_DESCRIPTION_CHARS,
            footer: DEFAULT_FOOTER.to_string(),
            color: DEFAULT_COLOR,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Fixed wait after every delivery attempt (webhook rate limit).
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_max_description(mut self, chars: usize) -> Self {
        self.max_description = chars;
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn build_payload(&self, listing: &Listing, now: DateTime<Utc>) -> DiscordWebhookPayload {
        let description = if listing.description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            truncate_chars(&listing.description, self.max_description)
        };

        DiscordWebhookPayload {
            content: None,
            embeds: vec![DiscordEmbed {
                title: truncate_chars(&listing.title, MAX_TITLE_CHARS),
                description,
                url: listing.url.clone(),
                color: self.color,
                fields: vec![
                    EmbedField::inline("Company", &listing.source_name),
                    EmbedField::inline("Location", &listing.location),
                    EmbedField::inline("Posted", &listing.published),
                ],
                footer: EmbedFooter {
                    text: self.footer.clone(),
                },
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            }],
        }
    }

    async fn post(&self, destination: &str, payload: &DiscordWebhookPayload) -> Result<()> {
        self.client
            .post(destination)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .context("discord webhook request failed")?
            .error_for_status()
            .context("discord webhook HTTP error")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, listing: &Listing, destination: &str) -> Delivery {
        if destination.trim().is_empty() {
            tracing::warn!(title = %listing.title, "no webhook URL configured; skipping");
            counter!("notifications_failed_total").increment(1);
            return Delivery::NoDestination;
        }

        let payload = self.build_payload(listing, Utc::now());
        let outcome = match self.post(destination, &payload).await {
            Ok(()) => {
                counter!("notifications_sent_total").increment(1);
                Delivery::Delivered
            }
            Err(e) => {
                tracing::warn!(
                    title = %listing.title,
                    destination = %redact(destination),
                    error = %format!("{e:#}"),
                    "discord delivery failed"
                );
                counter!("notifications_failed_total").increment(1);
                Delivery::Failed(format!("{e:#}"))
            }
        };

        tokio::time::sleep(self.pacing).await;
        outcome
    }
}

/// Keep the host only; webhook paths carry the token.
fn redact(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid url>".to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct DiscordWebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: &str) -> Self {
        // Discord rejects empty field values
        let value = if value.trim().is_empty() { "-" } else { value };
        Self {
            name: name.to_string(),
            value: truncate_chars(value, MAX_FIELD_CHARS),
            inline: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(description: &str) -> Listing {
        Listing {
            title: "Platform Engineer".into(),
            url: "https://jobs.example/1".into(),
            source_name: "Acme".into(),
            description: description.into(),
            location: "Stockholm".into(),
            published: "2025-03-01".into(),
        }
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("åäö", 2), "åä");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn payload_has_fields_footer_and_color() {
        let n = DiscordNotifier::new();
        let p = n.build_payload(&listing("Run k8s"), Utc::now());
        let e = &p.embeds[0];
        assert_eq!(e.title, "Platform Engineer");
        assert_eq!(e.url, "https://jobs.example/1");
        assert_eq!(e.color, 0x0077B5);
        assert_eq!(e.footer.text, "LinkedIn Job Alert");
        let names: Vec<_> = e.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Company", "Location", "Posted"]);
        assert!(e.fields.iter().all(|f| f.inline));
    }

    #[test]
    fn long_description_is_cut_to_limit() {
        let n = DiscordNotifier::new();
        let p = n.build_payload(&listing(&"x".repeat(5000)), Utc::now());
        assert_eq!(p.embeds[0].description.chars().count(), 4000);
    }

    #[test]
    fn empty_description_gets_placeholder() {
        let n = DiscordNotifier::new();
        let p = n.build_payload(&listing(""), Utc::now());
        assert_eq!(p.embeds[0].description, NO_DESCRIPTION);
    }

    #[test]
    fn redact_keeps_host_only() {
        assert_eq!(
            redact("https://discord.com/api/webhooks/123/secret"),
            "discord.com"
        );
        assert_eq!(redact("not a url"), "<invalid url>");
    }
}
