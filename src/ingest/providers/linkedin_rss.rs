use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{FeedSource, Listing, SearchQuery};
use crate::ingest::{capitalize, clean_description, fallback_published, NO_DESCRIPTION, UNKNOWN_COMPANY};

pub const LINKEDIN_JOBS_URL: &str = "https://www.linkedin.com/jobs/search/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) jobs-feed-notifier/0.1";

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    author: Option<String>,
    #[serde(rename = "dc:creator", alias = "creator")]
    creator: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    author: Option<AtomAuthor>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

/// Raw entry fields shared by both feed dialects.
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    company: Option<String>,
    summary: Option<String>,
    published: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl RawEntry {
    fn into_listing(self, location: &str) -> Option<Listing> {
        let title = non_empty(self.title)?;
        let url = non_empty(self.link)?;

        let description = self
            .summary
            .map(|s| clean_description(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        Some(Listing {
            title,
            url,
            source_name: non_empty(self.company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            description,
            location: capitalize(location),
            published: non_empty(self.published).unwrap_or_else(fallback_published),
        })
    }
}

impl From<Item> for RawEntry {
    fn from(it: Item) -> Self {
        Self {
            title: it.title,
            link: it.link,
            company: non_empty(it.author).or(it.creator),
            summary: it.description,
            published: it.pub_date,
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(e: AtomEntry) -> Self {
        let hrefs: Vec<(Option<String>, String)> = e
            .link
            .into_iter()
            .filter_map(|l| Some((l.rel, non_empty(l.href)?)))
            .collect();
        let link = hrefs
            .iter()
            .find(|(rel, _)| rel.as_deref().map_or(true, |r| r == "alternate"))
            .or_else(|| hrefs.first())
            .map(|(_, href)| href.clone());
        let summary = non_empty(e.summary.map(|t| t.value)).or(e.content.map(|t| t.value));
        Self {
            title: e.title.map(|t| t.value),
            link,
            company: e.author.and_then(|a| a.name),
            summary,
            published: e.published,
        }
    }
}

/// Job search feed (LinkedIn's public jobs search with `f_RSS=true`).
pub struct LinkedInRssSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl LinkedInRssSource {
    /// Serve a fixed feed body for every query (tests, demos).
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                client,
            },
        })
    }

    pub fn linkedin() -> Result<Self> {
        Self::from_base_url(LINKEDIN_JOBS_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Search URL for one query, keywords/location encoded.
    pub fn search_url(base_url: &str, query: &SearchQuery) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            base_url,
            &[
                ("keywords", query.keywords.as_str()),
                ("location", query.location.as_str()),
                ("trk", "public_jobs_jobs-search-bar_search-submit"),
                ("redirect", "false"),
                ("position", "1"),
                ("pageNum", "0"),
                ("f_RSS", "true"),
            ],
        )
        .with_context(|| format!("invalid feed base url {base_url}"))
    }

    /// Parse an RSS 2.0 or Atom body into listings, in feed order.
    /// Entries without a title or link are skipped.
    pub fn parse_feed(body: &str, location: &str) -> Result<Vec<Listing>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(body);

        let raw: Vec<RawEntry> = if is_atom(&xml_clean) {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom feed xml")?;
            feed.entry.into_iter().map(RawEntry::from).collect()
        } else if xml_clean.contains("<rss") {
            let rss: Rss = from_str(&xml_clean).context("parsing rss feed xml")?;
            rss.channel.item.into_iter().map(RawEntry::from).collect()
        } else {
            bail!("response is neither RSS nor Atom");
        };

        let total = raw.len();
        let out: Vec<Listing> = raw
            .into_iter()
            .filter_map(|e| e.into_listing(location))
            .collect();
        if out.len() < total {
            tracing::debug!(skipped = total - out.len(), "feed entries without title/link");
        }

        histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for LinkedInRssSource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_feed(s, &query.location),
            Mode::Http { base_url, client } => {
                let url = Self::search_url(base_url, query)?;
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("feed http get()")?
                    .error_for_status()
                    .context("feed non-2xx")?
                    .text()
                    .await
                    .context("feed http .text()")?;
                Self::parse_feed(&body, &query.location)
            }
        }
    }

    fn name(&self) -> &'static str {
        "linkedin-rss"
    }
}

fn is_atom(xml: &str) -> bool {
    !xml.contains("<rss") && xml.contains("<feed")
}

/// Rewrite HTML named entities into text XML accepts. The five XML
/// entities pass through; unknown names become literal `&amp;name;`.
fn scrub_html_entities_for_xml(s: &str) -> String {
    let s = s
        .replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...");

    static RE_NAMED: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_named =
        RE_NAMED.get_or_init(|| regex::Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());
    re_named
        .replace_all(&s, |caps: &regex::Captures| {
            let whole = &caps[0];
            if matches!(&caps[1], "amp" | "lt" | "gt" | "quot" | "apos") {
                return whole.to_string();
            }
            let decoded = html_escape::decode_html_entities(whole);
            if decoded == whole {
                format!("&amp;{}", &whole[1..])
            } else {
                // `&AMP;`, `&LT;` and friends decode to markup characters
                html_escape::encode_text(&decoded).into_owned()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let q = SearchQuery::new("site reliability", "new york", "");
        let url = LinkedInRssSource::search_url(LINKEDIN_JOBS_URL, &q).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://www.linkedin.com/jobs/search/?keywords=site+reliability"));
        assert!(s.contains("location=new+york"));
        assert!(s.ends_with("f_RSS=true"));
    }

    #[test]
    fn rss_item_prefers_author_then_creator() {
        let xml = r#"<rss version="2.0"><channel><title>x</title>
            <item><title>A</title><link>https://j/1</link><dc:creator>Acme</dc:creator></item>
            <item><title>B</title><link>https://j/2</link><author>Initech</author></item>
            </channel></rss>"#;
        let out = LinkedInRssSource::parse_feed(xml, "oslo").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_name, "Acme");
        assert_eq!(out[1].source_name, "Initech");
        assert_eq!(out[0].location, "Oslo");
    }

    #[test]
    fn entries_without_link_are_skipped() {
        let xml = r#"<rss><channel>
            <item><title>No link</title></item>
            <item><title>Kept</title><link>https://j/3</link></item>
            </channel></rss>"#;
        let out = LinkedInRssSource::parse_feed(xml, "oslo").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }

    #[test]
    fn scandinavian_entities_do_not_break_the_feed() {
        let xml = r#"<rss><channel>
            <item><title>Utvecklare G&ouml;teborg</title><link>https://j/1</link>
              <description>&lt;p&gt;Kontor i G&ouml;teborg &amp; Troms&oslash;&lt;/p&gt;</description></item>
            <item><title>B</title><link>https://j/2</link></item>
            </channel></rss>"#;
        let out = LinkedInRssSource::parse_feed(xml, "stockholm").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Utvecklare Göteborg");
        assert_eq!(out[0].description, "Kontor i Göteborg & Tromsø");
    }

    #[test]
    fn entity_scrub_keeps_xml_entities_and_escapes_unknown_ones() {
        assert_eq!(
            scrub_html_entities_for_xml("&aring;&auml; &amp;&lt;&gt; &bogus;"),
            "åä &amp;&lt;&gt; &amp;bogus;"
        );
    }

    #[test]
    fn items_separated_by_other_channel_elements_are_all_read() {
        let xml = r#"<rss><channel>
            <item><title>A</title><link>https://j/a</link></item>
            <lastBuildDate>x</lastBuildDate>
            <item><title>B</title><link>https://j/b</link></item>
            </channel></rss>"#;
        let out = LinkedInRssSource::parse_feed(xml, "oslo").unwrap();
        let titles: Vec<_> = out.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn atom_link_without_href_is_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title>A</title><link rel="self"/><link href="https://j/a"/></entry>
            <entry><title>B</title><link/></entry>
            </feed>"#;
        let out = LinkedInRssSource::parse_feed(xml, "oslo").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://j/a");
    }

    #[test]
    fn html_page_is_rejected() {
        let err = LinkedInRssSource::parse_feed("<html><body>login</body></html>", "oslo");
        assert!(err.is_err());
    }
}
