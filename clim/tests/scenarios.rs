//! End-to-end scenario tests against the documented file-format examples.

use clim::boundary::{AudioExtractor, FrameSource};
use clim::config::EncoderConfig;
use clim::error::{Error, Result};
use clim::frame::Frame;
use clim::pipeline::encode;

fn solid(width: u32, height: u32, color: [u8; 3]) -> Frame {
    Frame::new(width, height, vec![color; (width * height) as usize]).unwrap()
}

struct OneShotSource(Option<Vec<Frame>>);
impl FrameSource for OneShotSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<Frame>>> {
        Ok(self.0.take())
    }
}

struct NoAudio;
impl AudioExtractor for NoAudio {
    fn extract(&self, _: &std::path::Path, _: &std::path::Path, _: f64) -> Result<()> {
        Err(Error::AudioExtractionFailure("no source audio track".into()))
    }
}

fn encode_frames(frames: Vec<Frame>, config: &EncoderConfig) -> Vec<u8> {
    let mut source = OneShotSource(Some(frames));
    let mut out = Vec::new();
    encode(
        &mut source,
        None::<(&NoAudio, &std::path::Path, f64)>,
        config,
        &mut out,
    )
    .unwrap();
    out
}

/// S1: single solid-color 2x2 frame at 10 fps.
#[test]
fn s1_single_solid_frame_matches_the_documented_header() {
    let mut config = EncoderConfig::default();
    config.target_width = 2;
    config.target_height = 2;
    config.target_fps = 10.0;

    let bytes = encode_frames(vec![solid(2, 2, [10, 20, 30])], &config);

    // Clustering header for one cluster of size 1 packs 12 bits (all zero
    // fields) and pads out to two bytes, not one: IFBA = 12 (file header) +
    // 2 (clustering header) + 7 (one cluster: 6-byte palette header + one
    // 1-byte Huffman-only frame) = 21.
    assert_eq!(
        &bytes[0..12],
        &[0x01, 0x00, 0x02, 0x00, 0x02, 0x00, 0x64, 0, 0, 0, 0, 0x15]
    );
    assert_eq!(&bytes[12..14], &[0x00, 0x00]);
    // Palette header: size-1 == 0, then the RGB triple.
    assert_eq!(bytes[14], 0x00);
    assert_eq!(&bytes[15..18], &[10, 20, 30]);
}

/// S3: ten identical frames in one chunk produce exactly one cluster with
/// a one-color palette, and every frame selects the Huffman-only
/// encoding.
#[test]
fn s3_repeated_identical_frames_collapse_to_one_cluster() {
    let mut config = EncoderConfig::default();
    config.target_width = 2;
    config.target_height = 2;

    let frames = (0..10).map(|_| solid(2, 2, [5, 6, 7])).collect();
    let bytes = encode_frames(frames, &config);

    // Clustering header: one cluster of size 10. count_bit_length =
    // bit_length(1) = 1, size_bit_length = bit_length(10) = 4; the 15
    // packed bits spill into a second byte (see container.rs tests for the
    // exact bit layout).
    assert_eq!(bytes.len() >= 14, true);
    let clustering_header_len = 2;

    // Each of the 10 frames after the (6-byte) palette header is exactly
    // one byte: a 1-bit Huffman-only header plus four 1-bit codes, padded.
    let palette_header_len = 1 + 3 + 1 + 1; // size byte + rgb + lengths + codes (one color => 1 byte each for the packed fields)
    let frame_block_start = 12 + clustering_header_len + palette_header_len;
    let frame_bytes = &bytes[frame_block_start..frame_block_start + 10];
    assert!(frame_bytes.iter().all(|&b| b == 0x00));
}

/// S5: a failing audio extraction still leaves a valid, complete file
/// ending exactly at IFBA + the sum of chunk sizes.
#[test]
fn s5_failed_audio_extraction_yields_a_file_with_no_trailer() {
    let mut config = EncoderConfig::default();
    config.target_width = 2;
    config.target_height = 2;

    let mut source = OneShotSource(Some(vec![solid(2, 2, [1, 2, 3]), solid(2, 2, [9, 9, 9])]));
    let mut out = Vec::new();
    encode(&mut source, Some((&NoAudio, std::path::Path::new("in.mp4"), 1.0)), &config, &mut out).unwrap();

    // No audio trailer was appended: the file ends exactly at IFBA, which
    // is itself defined as header + clustering header + sum(chunk sizes)
    // (§4.6), leaving nothing past it to be larger than.
    let ifba = out[7..12].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64) as usize;
    assert_eq!(out.len(), ifba);
}

/// S6: a zero clustering-cap percentage forces exactly one cluster no
/// matter how different the frames are.
#[test]
fn s6_zero_cap_percent_forces_a_single_cluster() {
    let mut config = EncoderConfig::default();
    config.target_width = 2;
    config.target_height = 2;
    config.max_palette_segments_percent = 0.0;

    let frames = vec![
        solid(2, 2, [0, 0, 0]),
        solid(2, 2, [255, 255, 255]),
        solid(2, 2, [0, 0, 0]),
        solid(2, 2, [255, 255, 255]),
    ];
    let bytes = encode_frames(frames, &config);

    // A single cluster of size 4: clustering header encodes
    // count_bit_length-1=0 (5b, bit_length(1)=1), count-1=0 (1b),
    // size_bit_length-1=2 (5b, bit_length(4)=3), size-1=3 (3b).
    // Bits: 00000 0 00010 011 -> padded to two bytes.
    assert_eq!(bytes[12], 0x00);
    assert_eq!(bytes[13], 0b0100_1100);
}
