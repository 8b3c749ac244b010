//! `ffmpeg`-backed audio extraction with playback-speed correction
//! (§6.5): resamples the source's audio track so that its duration
//! matches `MSBF * frame_count` once the video has been played back at
//! the encoder's target fps.

use std::path::Path;
use std::process::{Command, Stdio};

use clim::boundary::AudioExtractor;
use clim::error::{Error, Result};

pub struct FfmpegAudioExtractor {
    extension: String,
}

impl FfmpegAudioExtractor {
    pub fn new(extension: &str) -> Self {
        FfmpegAudioExtractor {
            extension: extension.to_string(),
        }
    }
}

impl AudioExtractor for FfmpegAudioExtractor {
    fn extract(&self, source_path: &Path, out_path: &Path, speed_percentage: f64) -> Result<()> {
        clim::boundary::validate_speed_factor(speed_percentage)?;
        let speed_factor = 1.0 / speed_percentage;

        let out_with_ext = out_path.with_extension(self.extension.trim_start_matches('.'));
        let status = Command::new("ffmpeg")
            .args([
                "-y",
                "-i",
                &source_path.display().to_string(),
                "-vn",
                "-filter:a",
                &format!("atempo={speed_factor}"),
                &out_with_ext.display().to_string(),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::AudioExtractionFailure(format!("failed to spawn ffmpeg: {e}")))?;

        if !status.success() {
            return Err(Error::AudioExtractionFailure(format!(
                "ffmpeg exited with status {status}"
            )));
        }

        std::fs::copy(&out_with_ext, out_path)
            .map_err(|e| Error::AudioExtractionFailure(format!("reading extracted audio: {e}")))?;
        Ok(())
    }
}
