use thiserror::Error;

/// Every fallible operation in the encoder returns this error type.
///
/// The four variant families match the error kinds in the format's error
/// handling design: malformed input, violated internal invariants (bugs),
/// I/O failures, and the one deliberately non-fatal failure mode (audio
/// extraction).
#[derive(Error, Debug)]
pub enum Error {
    #[error("input error: {0}")]
    Input(String),

    #[error("encoding invariant violated: {0}")]
    EncodingInvariant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio extraction failed: {0}")]
    AudioExtractionFailure(String),
}

impl Error {
    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::EncodingInvariant(msg.into())
    }

    /// True for the one error kind the pipeline is permitted to recover
    /// from: a failed audio extraction leaves a valid, audio-less file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AudioExtractionFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
