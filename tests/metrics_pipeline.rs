// tests/metrics_pipeline.rs
use std::sync::Arc;
use std::time::Duration;

use jobs_feed_notifier::ingest::providers::LinkedInRssSource;
use jobs_feed_notifier::store::MemoryBackend;
use jobs_feed_notifier::{DiscordNotifier, RunCoordinator, SearchQuery};
use metrics_exporter_prometheus::PrometheusBuilder;

const RSS_XML: &str = include_str!("fixtures/linkedin_jobs_rss.xml");

#[tokio::test]
async fn counters_exposed_after_run() {
    // Install a local recorder for this test binary
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder");

    let feed = Arc::new(LinkedInRssSource::from_fixture(RSS_XML));
    // No destination: every delivery fails without touching the network
    let notifier = Arc::new(DiscordNotifier::new().with_pacing(Duration::ZERO));
    let backend = Arc::new(MemoryBackend::new());
    let coordinator = RunCoordinator::new(feed, notifier, Some(backend));

    let summary = coordinator
        .run(&[SearchQuery::new("devops", "stockholm", "")])
        .await;
    assert_eq!(summary.total, 0);

    let out = handle.render();
    assert!(out.contains("feed_listings_total"));
    assert!(out.contains("notifications_failed_total"));
    assert!(out.contains("runs_total"));
}
