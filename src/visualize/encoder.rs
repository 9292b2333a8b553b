use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Turns a numbered sequence of PNG frames into a video file.
pub trait VideoEncoder {
    /// `frame_pattern` is a printf-style path such as `dir/frame_%05d.png`.
    fn encode(&self, frame_pattern: &Path, fps: u32, output: &Path) -> Result<()>;
}

/// Encodes with an external `ffmpeg` binary as H.264 MP4.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    pub program: String,
    /// Target bitrate passed to `-b:v`, e.g. `1800k`.
    pub bitrate: String,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<String>, bitrate: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            bitrate: bitrate.into(),
        }
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, frame_pattern: &Path, fps: u32, output: &Path) -> Result<()> {
        let fps = fps.to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-framerate", fps.as_str(), "-i"])
            .arg(frame_pattern)
            .args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-b:v",
                self.bitrate.as_str(),
                "-metadata",
                "artist=state_vector",
            ])
            .arg(output);

        debug!(command = ?cmd, "Running video encoder");

        let out = cmd
            .output()
            .with_context(|| format!("failed to run '{}'", self.program))?;

        if !out.status.success() {
            bail!(
                "'{}' exited with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_an_error() {
        let encoder = FfmpegEncoder::new("definitely-not-an-encoder-binary", "1800k");
        let err = encoder
            .encode(Path::new("frame_%05d.png"), 5, Path::new("out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("definitely-not-an-encoder-binary"));
    }
}
