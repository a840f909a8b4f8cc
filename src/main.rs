//! Jobs feed notifier, one-shot runner.
//! Runs every configured search once and prints the trigger response as JSON.
//! Schedule it with cron/systemd timers; see `src/bin/lambda.rs` for AWS.

use jobs_feed_notifier::logging::{self, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    logging::init(LogFormat::Compact);

    let response = jobs_feed_notifier::run_from_env().await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
