//! AWS Lambda entry point. Meant for a scheduled (EventBridge) trigger; the
//! event payload is ignored.
//!
//! Build with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `CONFIG_FILE`: bundled config path (default `config.json`)
//! - `S3_BUCKET` / `S3_PREFIX`: seen-store location; a set `S3_BUCKET` selects
//!   the S3 store unless the config names another backend
//! - `RUST_LOG`: log filter

use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use jobs_feed_notifier::logging::{self, LogFormat};
use jobs_feed_notifier::TriggerResponse;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    logging::init(LogFormat::Json);
    info!("jobs-feed-notifier lambda starting");
    lambda_runtime::run(service_fn(handler)).await
}

async fn handler(event: LambdaEvent<Value>) -> Result<TriggerResponse, LambdaError> {
    let (_payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "run triggered");

    match jobs_feed_notifier::run_from_env().await {
        Ok(response) => Ok(response),
        Err(e) => {
            // Wiring errors only; pipeline failures are absorbed upstream.
            error!("lambda setup failed: {e:#}");
            Err(e.into())
        }
    }
}
