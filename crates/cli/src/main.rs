//! `dreamtrack` -- track one video generation job from the terminal.
//!
//! Submits the prompt given on the command line to the generation
//! service, prints every state transition as it happens, and exits
//! when the job completes or fails.
//!
//! # Environment variables
//!
//! | Variable                        | Required | Default                 |
//! |---------------------------------|----------|-------------------------|
//! | `DREAMTRACK_BASE_URL`           | no       | `http://localhost:5000` |
//! | `DREAMTRACK_POLL_INTERVAL_MS`   | no       | `5000`                  |
//! | `DREAMTRACK_REQUEST_TIMEOUT_MS` | no       | `30000`                 |

mod config;
mod render;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dreamtrack_tracker::api::GenerationApi;
use dreamtrack_tracker::config::TrackerConfig;
use dreamtrack_tracker::controller::GenerationTracker;

use config::CliConfig;
use render::render;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreamtrack=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: dreamtrack <prompt>");
        std::process::exit(2);
    }

    let config = CliConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting dreamtrack",
    );

    let api = GenerationApi::new(config.base_url.clone(), config.request_timeout);
    let tracker = GenerationTracker::spawn(
        Arc::new(api),
        TrackerConfig {
            poll_interval: config.poll_interval,
        },
    );
    let mut events = tracker.subscribe();

    if let Err(e) = tracker.submit(&prompt) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    while let Ok(state) = events.recv().await {
        println!("{}", render(&state));
        if state.is_terminal() {
            tracker.shutdown();
            if matches!(state, dreamtrack_core::state::GenerationState::Failed { .. }) {
                std::process::exit(1);
            }
            return;
        }
    }
}
