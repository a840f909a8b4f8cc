// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{FeedSource, FetchOutcome, SearchQuery};
use metrics::counter;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const NO_DESCRIPTION: &str = "No description available";

/// Clean an RSS/Atom summary for display: decode entities, turn block tags
/// into newlines, strip the remaining tags, collapse blank runs.
pub fn clean_description(s: &str) -> String {
    static RE_BREAKS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_breaks = RE_BREAKS
        .get_or_init(|| regex::Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</div>").unwrap());
    let mut out = re_breaks.replace_all(s, "\n").to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // Entities after tag stripping, so encoded `&lt;b&gt;` survives as text.
    out = html_escape::decode_html_entities(&out).to_string();
    out = out.replace('\u{00A0}', " ");

    static RE_SPACES: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_spaces = RE_SPACES.get_or_init(|| regex::Regex::new(r"[ \t\r\f\v]+").unwrap());
    out = re_spaces.replace_all(&out, " ").to_string();

    static RE_LINES: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_lines = RE_LINES.get_or_init(|| regex::Regex::new(r"\s*\n\s*").unwrap());
    out = re_lines
        .replace_all(&out, |caps: &regex::Captures| {
            // keep at most one blank line
            if caps[0].matches('\n').count() > 1 {
                "\n\n"
            } else {
                "\n"
            }
        })
        .to_string();

    out.trim().to_string()
}

/// First character upper-cased, the rest lower-cased ("STOCKHOLM" -> "Stockholm").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Today's UTC date, used when an entry carries no publication date.
pub fn fallback_published() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Fetch listings for one query. Errors are logged and returned as
/// [`FetchOutcome::Failed`]; a failed search never aborts the run.
pub async fn fetch(source: &dyn FeedSource, query: &SearchQuery) -> FetchOutcome {
    crate::metrics::ensure_described();

    match source.fetch_listings(query).await {
        Ok(listings) => {
            counter!("feed_listings_total").increment(listings.len() as u64);
            tracing::debug!(
                provider = source.name(),
                keywords = %query.keywords,
                location = %query.location,
                count = listings.len(),
                "feed fetched"
            );
            FetchOutcome::Fetched(listings)
        }
        Err(e) => {
            tracing::warn!(
                provider = source.name(),
                keywords = %query.keywords,
                location = %query.location,
                error = %format!("{e:#}"),
                "feed fetch failed"
            );
            counter!("feed_fetch_errors_total").increment(1);
            FetchOutcome::Failed(format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_description_strips_tags_and_entities() {
        let s = "<p>Build&nbsp;pipelines &amp; <b>ship</b></p><p>Remote ok</p>";
        assert_eq!(clean_description(s), "Build pipelines & ship\nRemote ok");
    }

    #[test]
    fn clean_description_keeps_paragraph_breaks() {
        let s = "First line<br/>\n<br>Second   line";
        assert_eq!(clean_description(s), "First line\n\nSecond line");
    }

    #[test]
    fn capitalize_matches_display_rules() {
        assert_eq!(capitalize("stockholm"), "Stockholm");
        assert_eq!(capitalize("OSLO"), "Oslo");
        assert_eq!(capitalize("new york"), "New york");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn fallback_published_is_a_plain_date() {
        let d = fallback_published();
        assert_eq!(d.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").is_ok());
    }
}
