//! Sends one sample listing to `$DEMO_WEBHOOK_URL` and prints the outcome.
//! This posts a real message to the webhook.

use std::time::Duration;

use jobs_feed_notifier::{DiscordNotifier, Listing, Notifier};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let webhook = std::env::var("DEMO_WEBHOOK_URL").unwrap_or_default();
    let notifier = DiscordNotifier::new().with_pacing(Duration::ZERO);

    let listing = Listing {
        title: "DevOps Engineer (demo)".into(),
        url: "https://www.linkedin.com/jobs/".into(),
        source_name: "Example AB".into(),
        description: "Demo listing sent by notify_demo. Kubernetes, Terraform, CI/CD.".into(),
        location: "Stockholm".into(),
        published: chrono::Utc::now().format("%Y-%m-%d").to_string(),
    };

    let outcome = notifier.notify(&listing, &webhook).await;
    println!("notify-demo done: {outcome:?}");
}
