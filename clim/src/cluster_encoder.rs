//! Frame-cluster encoder: builds one cluster's palette header followed by
//! all of its frames, each ending on a byte boundary (§4.5, §6.2).

use std::collections::HashMap;
use std::ops::Range;

use crate::bitstream::BitWriter;
use crate::config::EncoderConfig;
use crate::encoding::selector;
use crate::entropy::huffman::{self, Code};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::palette::{self, Palette};
use crate::util::bit_length;

/// Encodes `frames[range]` as one cluster: palette header + every frame's
/// selected encoding, concatenated. The return value is already a whole
/// number of bytes.
pub fn encode_cluster(frames: &[Frame], range: Range<usize>, config: &EncoderConfig) -> Result<Vec<u8>> {
    if range.is_empty() {
        return Err(Error::invariant("cluster must contain at least one frame"));
    }

    let (palette, indexed_frames) = palette::build_palette(frames, range, config)?;
    if palette.is_empty() {
        return Err(Error::invariant("palette must contain at least one color"));
    }

    let mut freqs: HashMap<u8, u64> = HashMap::new();
    for frame in &indexed_frames {
        for &index in frame.scan_row_major() {
            *freqs.entry(index).or_insert(0) += 1;
        }
    }

    // The palette header's code-length field is 3 bits wide (code_length -
    // 1), which hard-caps palette code length at 8 regardless of how large
    // a configured max-colors value might nominally suggest.
    let max_length = bit_length(config.max_palette_colors as u64).clamp(1, 8) as u8;
    let codes = huffman::build(&freqs, max_length)?;

    let mut out = BitWriter::new();
    write_palette_header(&mut out, &palette, &codes)?;

    for frame in &indexed_frames {
        let (_, bits) = selector::encode_frame(frame, &codes, &config.alignment)?;
        out.extend(&bits);
    }

    Ok(out.into_bytes())
}

fn write_palette_header(out: &mut BitWriter, palette: &Palette, codes: &HashMap<u8, Code>) -> Result<()> {
    let size = palette.len();
    if size == 0 || size > 256 {
        return Err(Error::invariant(format!("palette size {size} out of range 1..=256")));
    }

    out.write_bits((size - 1) as u64, 8);
    for color in palette.colors() {
        out.write_bits(color[0] as u64, 8);
        out.write_bits(color[1] as u64, 8);
        out.write_bits(color[2] as u64, 8);
    }

    let mut lengths = BitWriter::new();
    for i in 0..size {
        let code = codes[&(i as u8)];
        lengths.write_bits((code.len - 1) as u64, 3);
    }
    lengths.pad_to_byte();
    out.extend(&lengths);

    let mut code_bits = BitWriter::new();
    for i in 0..size {
        code_bits.write_code(codes[&(i as u8)]);
    }
    code_bits.pad_to_byte();
    out.extend(&code_bits);

    Ok(())
}
