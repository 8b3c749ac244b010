//! Command-line driver for the CLIM encoder. Wires `clap` arguments into
//! an [`clim::EncoderConfig`] and supplies `ffmpeg`-backed implementations
//! of the encoder's two external-boundary traits (frame acquisition, audio
//! extraction) - both explicitly out of scope for the core crate.

mod audio;
mod framer;

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use clim::config::AlignmentPolicy;
use clim::EncoderConfig;
use color_eyre::eyre::{Context, Result};
use tempdir::TempDir;

/// Encode a video into the CLIM container format.
#[derive(Parser, Debug)]
#[command(name = "clim_cli", version, about)]
struct Args {
    /// Source video file.
    input: PathBuf,

    /// Destination .clim file.
    output: PathBuf,

    #[arg(long, default_value_t = 103)]
    width: u32,

    #[arg(long, default_value_t = 29)]
    height: u32,

    #[arg(long, default_value_t = 12.0)]
    fps: f64,

    #[arg(long, default_value_t = 256)]
    max_chunk_size: usize,

    #[arg(long, default_value_t = 255)]
    max_palette_colors: u16,

    #[arg(long, default_value_t = true)]
    preprocess: bool,

    #[arg(long, default_value = ".mp3")]
    audio_extension: String,

    /// Skip audio extraction entirely, even if the source has a track.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = EncoderConfig {
        target_width: args.width,
        target_height: args.height,
        target_fps: args.fps,
        max_chunk_size: args.max_chunk_size,
        preprocess: args.preprocess,
        max_palette_colors: args.max_palette_colors,
        audio_extension: args.audio_extension.clone(),
        max_palette_segments_percent: 1.0,
        clustering_threshold: 1.0,
        alignment: AlignmentPolicy::default(),
    };
    config.validate().context("invalid encoder configuration")?;

    // Scoped temp directory for any preprocessed (resampled) video file the
    // framer produces; removed when this function returns.
    let preprocess_dir = TempDir::new("clim-preprocess")?;
    let mut source = framer::FfmpegFrameSource::new(&args.input, &config, preprocess_dir.path())?;

    let mut output = File::create(&args.output)
        .with_context(|| format!("creating output file {}", args.output.display()))?;

    let speed_percentage = clim::boundary::speed_percentage(config.target_fps);
    let extractor = audio::FfmpegAudioExtractor::new(&config.audio_extension);
    let audio = if args.no_audio {
        None
    } else {
        Some((&extractor, args.input.as_path(), speed_percentage))
    };

    clim::pipeline::encode(&mut source, audio, &config, &mut output)?;

    tracing::info!(output = %args.output.display(), "wrote CLIM container");
    Ok(())
}
