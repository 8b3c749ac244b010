//! Traits at the boundary with the external collaborators named as out of
//! scope in the purpose & scope section: frame acquisition and audio
//! extraction. The core crate only defines the contract; concrete adapters
//! (shelling out to `ffmpeg`, etc.) live in the CLI crate.

use crate::error::Result;
use crate::frame::Frame;

/// Supplies chunks of already-decoded, already-resampled frames to the
/// pipeline. Implementations own whatever video-decoding process produced
/// them; this crate never decodes video itself.
pub trait FrameSource {
    /// Returns the next chunk of frames, or `Ok(None)` at end of stream.
    fn next_chunk(&mut self) -> Result<Option<Vec<Frame>>>;

    /// A hint at the total number of chunks remaining, used only for
    /// progress reporting - never for correctness.
    fn chunk_count_hint(&self) -> Option<usize> {
        None
    }
}

/// Extracts and time-stretches the source's audio track. A failure here is
/// non-fatal to the overall encode (§7: `AudioExtractionFailure`); the
/// pipeline catches it and leaves the container file without an audio
/// trailer.
pub trait AudioExtractor {
    fn extract(&self, source_path: &std::path::Path, out_path: &std::path::Path, speed_percentage: f64) -> Result<()>;
}

/// `speed_percentage = round(fps) / fps`, per §6.5. The caller is expected
/// to reject (via [`crate::error::Error::Input`]) factors outside
/// `[0.5, 2.0]` before handing them to an [`AudioExtractor`].
pub fn speed_percentage(fps: f64) -> f64 {
    fps.round() / fps
}

/// Validates a speed factor against the documented `[0.5, 2.0]` contract.
pub fn validate_speed_factor(speed_percentage: f64) -> Result<()> {
    if !(0.5..=2.0).contains(&speed_percentage) {
        return Err(crate::error::Error::input(format!(
            "speed factor {speed_percentage} outside the supported [0.5, 2.0] range"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn speed_percentage_is_one_when_fps_is_already_integral() {
        assert_eq!(speed_percentage(12.0), 1.0);
    }

    #[test]
    fn out_of_range_speed_factor_is_rejected() {
        assert!(validate_speed_factor(0.4).is_err());
        assert!(validate_speed_factor(2.1).is_err());
        assert!(validate_speed_factor(1.0).is_ok());
    }
}
