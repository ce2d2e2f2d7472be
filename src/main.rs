//! CLI entry point for the S-Bahn approach estimator.
//!
//! Listens to the realtime feed for one collection window (or replays a
//! recorded one), reduces it to the next vehicles approaching the reference
//! station in each direction, and prints the result as JSON.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sbahn_eta::config::{FeedConfig, LineProfile};
use sbahn_eta::feed::{ReplaySource, collect, collect_live};
use sbahn_eta::matcher::nearest_waypoint;
use sbahn_eta::output::render;
use sbahn_eta::ranker::{DEFAULT_LIMIT, estimate};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Replays are bounded by the end of the file, not by wall-clock time.
const REPLAY_WINDOW: Duration = Duration::from_secs(3600);

#[derive(Parser)]
#[command(name = "sbahn_eta")]
#[command(about = "Next S-Bahn trains approaching a station, in both directions", long_about = None)]
struct Cli {
    /// Line profile JSON (waypoints, ETA tables); defaults to S8 at Daglfing
    #[arg(short, long, global = true, env = "LINE_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen to the live feed for one window and rank approaching vehicles
    Live {
        /// API key for the realtime feed
        #[arg(long, env = "GEOPS_API_KEY", hide_env_values = true)]
        api_key: String,

        /// WebSocket endpoint
        #[arg(long, env = "GEOPS_URL", default_value = FeedConfig::DEFAULT_URL)]
        url: String,

        /// Origin header sent with the handshake
        #[arg(long, env = "GEOPS_ORIGIN", default_value = FeedConfig::DEFAULT_ORIGIN)]
        origin: String,

        /// Collection window in seconds
        #[arg(short, long, default_value_t = 10)]
        window_secs: u64,

        /// Hard limit for connect + collection in seconds; must exceed the window
        #[arg(short, long, default_value_t = 15)]
        timeout_secs: u64,

        /// Vehicles listed per direction
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Indent the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Rank approaching vehicles from a recorded window (one message per line)
    Replay {
        #[arg(value_name = "FILE")]
        source: String,

        /// Vehicles listed per direction
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Indent the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the waypoint table and ETA model of the profile
    Corridor,
    /// Show which waypoint a projected position matches
    Nearest {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sbahn_eta.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sbahn_eta.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let profile = LineProfile::load_or_default(cli.profile.as_deref())?;
    let corridor = profile.corridor().context("invalid line profile")?;
    let classifier = profile.classifier();

    match cli.command {
        Commands::Live {
            api_key,
            url,
            origin,
            window_secs,
            timeout_secs,
            limit,
            pretty,
        } => {
            let config = FeedConfig {
                url,
                origin,
                window: Duration::from_secs(window_secs),
                hard_timeout: Duration::from_secs(timeout_secs),
                ..FeedConfig::geops(api_key)
            };
            config.validate().context("invalid feed timings")?;
            let batch = collect_live(&config, &profile.line_name).await;
            let approaches = estimate(batch.reports, &corridor, &classifier, limit);
            println!("{}", render(&approaches, pretty)?);
        }
        Commands::Replay {
            source,
            limit,
            pretty,
        } => {
            let mut replay = ReplaySource::from_file(&source)?;
            let batch = collect(&mut replay, REPLAY_WINDOW, &profile.line_name).await;
            let approaches = estimate(batch.reports, &corridor, &classifier, limit);
            println!("{}", render(&approaches, pretty)?);
        }
        Commands::Corridor => {
            info!(
                line = %profile.line_name,
                reference = %corridor.reference(),
                waypoints = corridor.waypoints().len(),
                "Corridor"
            );
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Nearest { x, y } => {
            let waypoint = nearest_waypoint(&corridor, geo::coord! { x: x, y: y });
            println!("{}", waypoint.name);
        }
    }

    Ok(())
}
