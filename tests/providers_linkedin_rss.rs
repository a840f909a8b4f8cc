// tests/providers_linkedin_rss.rs
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, routing::get, Router};
use jobs_feed_notifier::ingest::providers::LinkedInRssSource;
use jobs_feed_notifier::ingest::{self, types::FeedSource};
use jobs_feed_notifier::{FetchOutcome, SearchQuery};
use std::collections::HashMap;
use tokio::net::TcpListener;

const RSS_XML: &str = include_str!("fixtures/linkedin_jobs_rss.xml");
const ATOM_XML: &str = include_str!("fixtures/jobs_atom.xml");
const NORDIC_RSS_XML: &str = include_str!("fixtures/linkedin_jobs_nordic_rss.xml");

fn stockholm() -> SearchQuery {
    SearchQuery::new("devops", "stockholm", "https://hook.example/a")
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind feed server");
    let addr = listener.local_addr().expect("feed server addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/jobs/search/")
}

#[tokio::test]
async fn rss_fixture_maps_fields_and_defaults() {
    let source = LinkedInRssSource::from_fixture(RSS_XML);
    let items = source.fetch_listings(&stockholm()).await.expect("rss parse ok");
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.title, "DevOps Engineer");
    assert_eq!(first.url, "https://se.linkedin.com/jobs/view/devops-engineer-at-spotify-3901");
    assert_eq!(first.source_name, "Spotify");
    assert_eq!(first.location, "Stockholm");
    assert_eq!(first.published, "Mon, 03 Mar 2025 09:00:00 GMT");
    assert_eq!(
        first.description,
        "Join our platform team.\nKubernetes & Terraform experience."
    );

    let second = &items[1];
    assert_eq!(second.source_name, "Klarna");
    assert_eq!(second.description, "On-call rotation - 1 week in 6.");

    // Missing author/summary/pubDate fall back
    let third = &items[2];
    assert_eq!(third.source_name, "Unknown Company");
    assert_eq!(third.description, "No description available");
    assert_eq!(third.published, chrono::Utc::now().format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn atom_fixture_parses() {
    let source = LinkedInRssSource::from_fixture(ATOM_XML);
    let q = SearchQuery::new("platform", "OSLO", "");
    let items = source.fetch_listings(&q).await.expect("atom parse ok");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Platform Engineer");
    assert_eq!(items[0].url, "https://jobs.example/oslo/platform-1");
    assert_eq!(items[0].source_name, "Equinor");
    assert_eq!(items[0].description, "Terraform and GitOps");
    assert_eq!(items[0].published, "2025-03-04T08:30:00Z");
    assert_eq!(items[0].location, "Oslo");
    assert_eq!(items[1].source_name, "Unknown Company");
    // `updated` is not a publication date
    assert_eq!(items[1].published, chrono::Utc::now().format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn html_named_entities_keep_every_item() {
    let source = LinkedInRssSource::from_fixture(NORDIC_RSS_XML);
    let items = source
        .fetch_listings(&SearchQuery::new("utvecklare", "göteborg", ""))
        .await
        .expect("entities resolved");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Backendutvecklare Göteborg");
    assert_eq!(items[0].source_name, "Volvo Cars");
    assert!(items[0].description.contains("kontor i Göteborg och Malmö"));
    assert!(items[0].description.contains("Tromsø"));
    assert_eq!(items[1].title, "Driftsingenjör");
    assert_eq!(items[0].location, "Göteborg");
}

#[tokio::test]
async fn identifiers_are_stable_across_fetches() {
    let source = LinkedInRssSource::from_fixture(RSS_XML);
    let a = source.fetch_listings(&stockholm()).await.unwrap();
    let b = source.fetch_listings(&stockholm()).await.unwrap();
    let ids_a: Vec<_> = a.iter().map(|l| l.identifier()).collect();
    let ids_b: Vec<_> = b.iter().map(|l| l.identifier()).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(
        ids_a[0],
        "DevOps Engineer-Spotify-https://se.linkedin.com/jobs/view/devops-engineer-at-spotify-3901"
    );
}

#[tokio::test]
async fn http_mode_sends_search_params() {
    let app = Router::new().route(
        "/jobs/search/",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let ok = params.get("keywords").map(String::as_str) == Some("devops")
                && params.get("location").map(String::as_str) == Some("stockholm")
                && params.get("f_RSS").map(String::as_str) == Some("true");
            if ok {
                (StatusCode::OK, RSS_XML.to_string())
            } else {
                (StatusCode::BAD_REQUEST, String::new())
            }
        }),
    );
    let base = serve(app).await;

    let source = LinkedInRssSource::from_base_url(base, Duration::from_secs(5)).unwrap();
    let outcome = ingest::fetch(&source, &stockholm()).await;
    match outcome {
        FetchOutcome::Fetched(items) => assert_eq!(items.len(), 3),
        FetchOutcome::Failed(e) => panic!("expected listings, got error: {e}"),
    }
}

#[tokio::test]
async fn http_error_status_becomes_failed_outcome() {
    let app = Router::new().route(
        "/jobs/search/",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = serve(app).await;

    let source = LinkedInRssSource::from_base_url(base, Duration::from_secs(5)).unwrap();
    let outcome = ingest::fetch(&source, &stockholm()).await;
    assert!(outcome.error().is_some());
    assert!(outcome.into_listings().is_empty());
}

#[tokio::test]
async fn unreachable_feed_becomes_failed_outcome() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source =
        LinkedInRssSource::from_base_url(format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
    let outcome = ingest::fetch(&source, &stockholm()).await;
    assert!(matches!(outcome, FetchOutcome::Failed(_)));
}
