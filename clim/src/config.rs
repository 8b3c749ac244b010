//! Encoder configuration.
//!
//! Threaded through the pipeline by value; there is no process-wide or
//! singleton configuration state anywhere in this crate.

use crate::error::{Error, Result};

/// Per-frame alignment policy for the encoding selector (§4.4). The format
/// only requires the combined (header + sequence) candidate to land on a
/// byte boundary; header- and sequence-only alignment exist as documented
/// knobs, not because any known encoder profile needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentPolicy {
    pub align_header: bool,
    pub align_sequence: bool,
    pub align_combined: bool,
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        AlignmentPolicy {
            align_header: false,
            align_sequence: false,
            align_combined: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub target_fps: f64,
    pub max_chunk_size: usize,
    pub preprocess: bool,
    pub max_palette_colors: u16,
    pub audio_extension: String,
    /// Caps the clustering engine's target cluster count `K` at
    /// `max(1, floor(max_palette_segments_percent * N))`. The source's
    /// default of 1.0 imposes no real cap (K can reach N); 0.0 forces
    /// exactly one cluster regardless of content (see scenario S6).
    pub max_palette_segments_percent: f64,
    /// The `threshold` multiplier in `calculate_dynamic_clusters`: a
    /// neighbor distance counts toward `K` when it exceeds
    /// `threshold * stddev(distances)`. Documented as a tunable knob, not a
    /// statistically justified bound (see Design Notes, Open Question 1).
    pub clustering_threshold: f64,
    pub alignment: AlignmentPolicy,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            target_width: 103,
            target_height: 29,
            target_fps: 12.0,
            max_chunk_size: 256,
            preprocess: true,
            max_palette_colors: 255,
            audio_extension: ".mp3".to_string(),
            max_palette_segments_percent: 1.0,
            clustering_threshold: 1.0,
            alignment: AlignmentPolicy::default(),
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(Error::input("target dimensions must be positive"));
        }
        if !(self.target_fps > 0.0) {
            return Err(Error::input("target fps must be positive"));
        }
        if self.max_chunk_size == 0 {
            return Err(Error::input("max chunk size must be positive"));
        }
        if self.max_palette_colors == 0 || self.max_palette_colors > 256 {
            return Err(Error::input("max palette colors must be in 1..=256"));
        }
        Ok(())
    }

    /// MSBF: milliseconds between frames, stored as a big-endian u16 in the
    /// file header (§6.1).
    pub fn msbf(&self) -> Result<u16> {
        let ms = (1000.0 / self.target_fps).round();
        if !(0.0..=u16::MAX as f64).contains(&ms) {
            return Err(Error::input("fps out of representable range for MSBF"));
        }
        Ok(ms as u16)
    }
}
