//! Encoder for the CLIM lossy video container.
//!
//! The pipeline is: frame chunks -> temporal clustering -> per-cluster
//! palette quantization -> per-frame Huffman/RLE selection -> container
//! assembly. See [`pipeline::encode`] for the entry point.

pub mod bitstream;
pub mod boundary;
pub mod cluster_encoder;
pub mod clustering;
pub mod config;
pub mod container;
pub mod encoding;
pub mod entropy;
pub mod error;
pub mod frame;
pub mod palette;
pub mod pipeline;
pub mod util;

pub use config::EncoderConfig;
pub use error::{Error, Result};
pub use frame::Frame;
