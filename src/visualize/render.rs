use anyhow::{Result, anyhow};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::colormap::Colormap;
use super::frames::Frame;

pub const FRAME_WIDTH: u32 = 1200;
pub const FRAME_HEIGHT: u32 = 600;

/// printf-style name of the rendered frames, as understood by ffmpeg.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

pub fn frame_file_name(n: usize) -> String {
    format!("frame_{:05}.png", n)
}

/// Draws one bar chart per frame into `dir` as `frame_00000.png`, ...
///
/// Bars span [0, 1] on the y axis and are colored by `cmap`. The frame's
/// date is printed in the top-left corner.
pub fn render_frames(
    frames: &[Frame],
    title: &str,
    cmap: &Colormap,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    frames
        .iter()
        .enumerate()
        .map(|(n, frame)| {
            let path = dir.join(frame_file_name(n));
            render_frame(frame, title, cmap, &path)?;
            Ok(path)
        })
        .collect()
}

fn render_frame(frame: &Frame, title: &str, cmap: &Colormap, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (FRAME_WIDTH, FRAME_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to clear frame: {}", e))?;

    let dims = frame.values.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.5f64..dims - 0.5, 0f64..1f64)
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("State Vector Dimensions")
        .y_desc("Value")
        .draw()
        .map_err(|e| anyhow!("Failed to draw axes: {}", e))?;

    chart
        .draw_series(frame.values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            let h = v.clamp(0.0, 1.0);
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, h)], cmap.color(h).filled())
        }))
        .map_err(|e| anyhow!("Failed to draw bars: {}", e))?;

    root.draw(&Text::new(
        frame.date.format("%Y-%m-%d").to_string(),
        (80, 60),
        ("sans-serif", 18).into_font(),
    ))
    .map_err(|e| anyhow!("Failed to draw date: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;

    Ok(())
}
