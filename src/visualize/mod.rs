//! Bar-chart animations of aggregated state-vector CSVs.
//!
//! Each input CSV becomes one video: rows are grouped by calendar date,
//! each date's mean vector is drawn as a frame, and the frames are handed
//! to a [`VideoEncoder`] in chronological order.

pub mod colormap;
pub mod encoder;
pub mod frames;
pub mod render;

pub use colormap::Colormap;
pub use encoder::{FfmpegEncoder, VideoEncoder};
pub use frames::{Frame, daily_frames};

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ingest::discover_csv_files;
use crate::output::read_series;

/// Marker that identifies exported state-vector files.
pub const STATE_VECTOR_MARKER: &str = "_state_vector";

pub const DEFAULT_FPS: u32 = 5;

/// Location and aggregation period encoded in an exported file name.
///
/// `Tokyo_state_vector_D.csv` gives `("Tokyo", Some("D"))`.
pub fn parse_output_name(file_name: &str) -> Option<(&str, Option<&str>)> {
    let stem = file_name.strip_suffix(".csv")?;
    let pos = stem.rfind(STATE_VECTOR_MARKER)?;
    let location = &stem[..pos];
    let rest = &stem[pos + STATE_VECTOR_MARKER.len()..];

    if location.is_empty() {
        return None;
    }
    match rest.strip_prefix('_') {
        Some(period) if !period.is_empty() => Some((location, Some(period))),
        _ if rest.is_empty() => Some((location, None)),
        _ => None,
    }
}

/// `{location}_{period}_animation.mp4`, or `{location}_animation.mp4`.
pub fn animation_file_name(location: &str, period: Option<&str>) -> String {
    match period {
        Some(p) => format!("{}_{}_animation.mp4", location, p),
        None => format!("{}_animation.mp4", location),
    }
}

/// Pairs every state-vector CSV in `input_dir` with its video path in
/// `output_dir`, sorted by input file name.
pub fn plan_animations(input_dir: &Path, output_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut plan = Vec::new();
    for path in discover_csv_files(input_dir)? {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((location, period)) = parse_output_name(file_name) else {
            continue;
        };
        let output = output_dir.join(animation_file_name(location, period));
        plan.push((path, output));
    }
    Ok(plan)
}

/// Renders the animation of one state-vector CSV into `output`.
///
/// Returns the number of frames encoded.
#[tracing::instrument(skip_all, fields(csv = %csv_file.display(), output = %output.display()))]
pub fn create_animation(
    csv_file: &Path,
    output: &Path,
    fps: u32,
    encoder: &impl VideoEncoder,
) -> Result<usize> {
    let series = read_series(csv_file)?;
    let frames = daily_frames(&series);
    if frames.is_empty() {
        bail!("{} has no rows to animate", csv_file.display());
    }

    let file_name = csv_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let location = parse_output_name(file_name)
        .map(|(location, _)| location)
        .unwrap_or(file_name);
    let title = format!("State Vector Visualization for {}", location);

    let workdir = tempfile::tempdir().context("cannot create frame directory")?;
    render::render_frames(&frames, &title, &Colormap::state_vector(), workdir.path())?;

    encoder.encode(&workdir.path().join(render::FRAME_PATTERN), fps, output)?;

    Ok(frames.len())
}

/// Animates every state-vector CSV in `input_dir` into `output_dir`.
///
/// `output_dir` is created if needed. Stops at the first failing file.
#[tracing::instrument(skip_all, fields(input_dir = %input_dir.display(), output_dir = %output_dir.display()))]
pub fn animate_directory(
    input_dir: &Path,
    output_dir: &Path,
    fps: u32,
    encoder: &impl VideoEncoder,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let plan = plan_animations(input_dir, output_dir)?;
    if plan.is_empty() {
        info!("No state vector files to animate");
    }

    let mut written = Vec::with_capacity(plan.len());
    for (input, output) in plan {
        info!(file = %input.display(), "Processing");
        let frames = create_animation(&input, &output, fps, encoder)
            .with_context(|| format!("animating {}", input.display()))?;
        info!(output = %output.display(), frames, "Animation written");
        written.push(output);
    }

    Ok(written)
}
