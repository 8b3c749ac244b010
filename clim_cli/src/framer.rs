//! `ffmpeg`-backed frame acquisition: resamples the source video to the
//! target width/height/fps (when `preprocess` is set) and decodes frames
//! in fixed-size chunks, handing them to the core crate via
//! [`clim::boundary::FrameSource`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clim::boundary::FrameSource;
use clim::error::{Error, Result};
use clim::{EncoderConfig, Frame};

pub struct FfmpegFrameSource {
    child_stdout: std::process::ChildStdout,
    width: u32,
    height: u32,
    max_chunk_size: usize,
    exhausted: bool,
    // Keeps the preprocessed file (if any) and the ffmpeg child process
    // alive for the lifetime of the source.
    _preprocessed_path: Option<PathBuf>,
    _child: std::process::Child,
}

impl FfmpegFrameSource {
    pub fn new(input: &Path, config: &EncoderConfig, scratch_dir: &Path) -> Result<Self> {
        let (decode_input, preprocessed_path) = if config.preprocess {
            let resampled = scratch_dir.join("resampled.mp4");
            run_ffmpeg(&[
                "-y",
                "-i",
                &input.display().to_string(),
                "-vf",
                &format!(
                    "scale={}:{}:flags=neighbor,fps={}",
                    config.target_width, config.target_height, config.target_fps
                ),
                &resampled.display().to_string(),
            ])?;
            (resampled.clone(), Some(resampled))
        } else {
            (input.to_path_buf(), None)
        };

        let mut child = Command::new("ffmpeg")
            .args([
                "-i",
                &decode_input.display().to_string(),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::input(format!("failed to spawn ffmpeg: {e}")))?;

        let child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::input("ffmpeg produced no stdout pipe"))?;

        Ok(FfmpegFrameSource {
            child_stdout,
            width: config.target_width,
            height: config.target_height,
            max_chunk_size: config.max_chunk_size,
            exhausted: false,
            _preprocessed_path: preprocessed_path,
            _child: child,
        })
    }

    fn read_one_frame(&mut self) -> Result<Option<Frame>> {
        let frame_bytes = (self.width as usize) * (self.height as usize) * 3;
        let mut buf = vec![0u8; frame_bytes];
        match self.child_stdout.read_exact(&mut buf) {
            Ok(()) => {
                let pixels = buf.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
                Ok(Some(Frame::new(self.width, self.height, pixels)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<Frame>>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut chunk = Vec::new();
        while chunk.len() < self.max_chunk_size {
            match self.read_one_frame()? {
                Some(frame) => chunk.push(frame),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}

fn run_ffmpeg(args: &[&str]) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::input(format!("failed to spawn ffmpeg: {e}")))?;
    if !status.success() {
        return Err(Error::input(format!("ffmpeg exited with status {status}")));
    }
    Ok(())
}
