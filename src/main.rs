//! CLI entry point for the weather state-vector tool.
//!
//! Provides subcommands for turning per-variable weather CSVs into
//! aggregated per-location state vectors, and for animating those vectors
//! as bar-chart videos.

use anyhow::Result;
use clap::{Parser, Subcommand};
use state_vector::aggregate::AggregationPeriod;
use state_vector::output::print_json;
use state_vector::pipeline::{DEFAULT_CATEGORICAL_MARKER, process_weather_data};
use state_vector::visualize::{DEFAULT_FPS, FfmpegEncoder, animate_directory};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "state_vector")]
#[command(about = "Build and animate weather state vectors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one aggregated state-vector CSV per location
    Process {
        /// Directory of per-variable CSV files
        #[arg(short, long, default_value = "source_data")]
        source_dir: PathBuf,

        /// Directory to write `{location}_state_vector_{period}.csv` files to
        #[arg(short, long, default_value = "output_data")]
        output_dir: PathBuf,

        /// Aggregation period: all, pentad, or [n]min/H/D/W/M.
        /// File names use the canonical spelling (MS and ME become M, h becomes H)
        #[arg(short, long, default_value = "D")]
        period: AggregationPeriod,

        /// Files whose name contains this are categorical
        #[arg(long, default_value = DEFAULT_CATEGORICAL_MARKER)]
        categorical_marker: String,
    },
    /// Render a bar-chart video for every state-vector CSV
    Animate {
        /// Directory containing state-vector CSVs
        #[arg(short, long, default_value = "output_data")]
        input_dir: PathBuf,

        /// Directory to write videos to
        #[arg(short, long, default_value = "animations")]
        output_dir: PathBuf,

        /// Frames (days) per second
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Video bitrate passed to the encoder
        #[arg(long, default_value = "1800k")]
        bitrate: String,

        /// ffmpeg binary (falls back to FFMPEG_BIN, then `ffmpeg`)
        #[arg(long)]
        ffmpeg: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/state_vector.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("state_vector.log"));

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

    match cli.command {
        Commands::Process {
            source_dir,
            output_dir,
            period,
            categorical_marker,
        } => {
            let summary =
                process_weather_data(&source_dir, &output_dir, period, &categorical_marker)?;
            print_json(&summary)?;
        }
        Commands::Animate {
            input_dir,
            output_dir,
            fps,
            bitrate,
            ffmpeg,
        } => {
            let program = ffmpeg
                .or_else(|| std::env::var("FFMPEG_BIN").ok())
                .unwrap_or_else(|| "ffmpeg".to_string());
            let encoder = FfmpegEncoder::new(program, bitrate);

            let written = animate_directory(&input_dir, &output_dir, fps, &encoder)?;
            info!(videos = written.len(), output_dir = %output_dir.display(), "Animations complete");
        }
    }

    Ok(())
}
