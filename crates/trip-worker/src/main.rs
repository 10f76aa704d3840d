//! Worker environment self-check.
//!
//! The host application embeds `JourneyEngine` and `RenderService` with its
//! own collaborator implementations and scheduler; this binary verifies the
//! environment those runs depend on (renderer binaries, configuration) and
//! prints the effective config.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trip_media::{check_ffmpeg, check_ffprobe};
use trip_worker::JourneyConfig;

fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("trip_worker=info".parse().expect("valid directive"))
        .add_directive("trip_media=info".parse().expect("valid directive"))
        .add_directive("trip_cluster=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("trip-worker self-check");

    let config = JourneyConfig::from_env();
    info!("Effective config: {:?}", config);

    let mut healthy = true;

    match check_ffmpeg() {
        Ok(path) => info!("ffmpeg found at {}", path.display()),
        Err(err) => {
            error!("{err}; journey videos cannot be rendered");
            healthy = false;
        }
    }
    match check_ffprobe() {
        Ok(path) => info!("ffprobe found at {}", path.display()),
        Err(err) => {
            error!("{err}; media probing is unavailable");
            healthy = false;
        }
    }

    if let Some(dir) = &config.soundtrack_dir {
        if dir.is_dir() {
            info!("soundtrack pool at {}", dir.display());
        } else {
            error!("soundtrack dir {} does not exist", dir.display());
            healthy = false;
        }
    }

    if !healthy {
        std::process::exit(1);
    }
    info!("environment looks good");
}
