use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_listings_total", "Listings parsed from job feeds.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!(
            "seen_store_errors_total",
            "Seen-store lookups/writes that failed (fail open)."
        );
        describe_counter!(
            "listings_skipped_seen_total",
            "Listings skipped because they were already announced."
        );
        describe_counter!("notifications_sent_total", "Webhook deliveries acknowledged.");
        describe_counter!(
            "notifications_failed_total",
            "Webhook deliveries that failed or had no destination."
        );
        describe_counter!("runs_total", "Completed runs over all configured searches.");
    });
}
