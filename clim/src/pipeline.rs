//! Chunk pipeline: drives an external [`crate::boundary::FrameSource`]
//! chunk by chunk, encoding and flushing each one to a scratch file before
//! the next is read, then assembles the final container (§4.6, §5).

use std::io::Write;
use std::path::Path;

use tempdir::TempDir;

use crate::boundary::{AudioExtractor, FrameSource};
use crate::cluster_encoder;
use crate::clustering;
use crate::config::EncoderConfig;
use crate::container;
use crate::error::{Error, Result};

struct EncodedChunk {
    scratch_path: std::path::PathBuf,
    byte_len: usize,
    /// Local cluster boundaries (frame indices within this chunk).
    local_starts: Vec<usize>,
    frame_count: usize,
}

/// Encodes every chunk `source` yields, writes the assembled CLIM
/// container to `output`, and - if `audio` is given - appends the
/// extracted audio trailer. An audio extraction failure is logged and
/// treated as non-fatal: the container is still written, just without a
/// trailer.
pub fn encode<S, A>(
    source: &mut S,
    audio: Option<(&A, &Path, f64)>,
    config: &EncoderConfig,
    mut output: impl Write,
) -> Result<()>
where
    S: FrameSource,
    A: AudioExtractor,
{
    config.validate()?;

    let scratch_dir = TempDir::new("clim-chunks")?;
    let mut chunks = Vec::new();
    let mut chunk_index = 0usize;

    #[cfg(feature = "tracing")]
    let chunk_hint = source.chunk_count_hint();

    while let Some(frames) = source.next_chunk()? {
        if frames.is_empty() {
            return Err(Error::input("a chunk must contain at least one frame"));
        }
        if frames.len() > config.max_chunk_size {
            return Err(Error::input(format!(
                "chunk of {} frames exceeds the configured max_chunk_size of {}",
                frames.len(),
                config.max_chunk_size
            )));
        }

        let local_starts = clustering::segment_starts(&frames, config)?;
        let mut ranges = Vec::with_capacity(local_starts.len());
        for (i, &start) in local_starts.iter().enumerate() {
            let end = local_starts.get(i + 1).copied().unwrap_or(frames.len());
            ranges.push(start..end);
        }

        let mut chunk_bytes = Vec::new();
        for range in ranges {
            chunk_bytes.extend(cluster_encoder::encode_cluster(&frames, range, config)?);
        }

        let scratch_path = scratch_dir.path().join(format!("chunk-{chunk_index:08}.bin"));
        std::fs::write(&scratch_path, &chunk_bytes)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            chunk = chunk_index,
            chunk_hint = ?chunk_hint,
            frames = frames.len(),
            clusters = local_starts.len(),
            bytes = chunk_bytes.len(),
            "encoded chunk"
        );

        chunks.push(EncodedChunk {
            scratch_path,
            byte_len: chunk_bytes.len(),
            local_starts,
            frame_count: frames.len(),
        });
        chunk_index += 1;
    }

    if chunks.is_empty() {
        return Err(Error::input("no frames were produced by the frame source"));
    }

    let mut global_starts = Vec::new();
    let mut frame_offset = 0usize;
    for chunk in &chunks {
        for &start in &chunk.local_starts {
            global_starts.push(frame_offset + start);
        }
        frame_offset += chunk.frame_count;
    }
    global_starts.push(frame_offset); // sentinel: grand total frame count

    let cluster_sizes: Vec<usize> = global_starts.windows(2).map(|w| w[1] - w[0]).collect();
    let clustering_header = container::clustering_header(&cluster_sizes)?;

    let sum_chunk_bytes: usize = chunks.iter().map(|c| c.byte_len).sum();
    let ifba = container::FILE_HEADER_LEN + clustering_header.len() + sum_chunk_bytes;

    let width = u16::try_from(config.target_width).map_err(|_| Error::input("target width too large for the file header"))?;
    let height = u16::try_from(config.target_height).map_err(|_| Error::input("target height too large for the file header"))?;
    let msbf = config.msbf()?;
    let file_header = container::file_header(width, height, msbf, ifba as u64)?;

    output.write_all(&file_header)?;
    output.write_all(&clustering_header)?;
    for chunk in &chunks {
        let bytes = std::fs::read(&chunk.scratch_path)?;
        output.write_all(&bytes)?;
    }

    if let Some((extractor, source_path, speed_percentage)) = audio {
        crate::boundary::validate_speed_factor(speed_percentage)?;
        let audio_path = scratch_dir.path().join("audio.bin");
        match extractor.extract(source_path, &audio_path, speed_percentage) {
            Ok(()) => {
                let audio_bytes = std::fs::read(&audio_path)?;
                output.write_all(&audio_bytes)?;
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "audio extraction failed; writing container without an audio trailer");
                let _ = err; // non-fatal: the container file without audio remains valid (§7).
            }
        }
    }

    output.flush()?;
    Ok(())
}
