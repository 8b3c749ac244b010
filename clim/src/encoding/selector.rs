//! Per-frame encoding selector: builds the three candidate bitstreams and
//! picks the smallest, with a fixed tie-break order.

use std::collections::HashMap;

use crate::bitstream::BitWriter;
use crate::config::AlignmentPolicy;
use crate::entropy::huffman::{self, Code};
use crate::error::Result;
use crate::frame::{rle_runs, IndexedFrame};
use crate::util::bit_length;

/// `Hc` (the RLE-count Huffman codebook) is length-limited to 16 bits; the
/// RLE+Huffman header's `len(code) - 1` field is 4 bits wide, which caps
/// code length at 16 anyway.
const RLE_COUNT_MAX_LENGTH: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Huffman,
    RleFixed,
    RleHuffman,
}

/// Builds the selected candidate's finalized (and aligned) bitstream for
/// one frame, plus which candidate won - useful for tests and tracing.
pub fn encode_frame(
    indexed: &IndexedFrame,
    palette_codes: &HashMap<u8, Code>,
    alignment: &AlignmentPolicy,
) -> Result<(CandidateKind, BitWriter)> {
    let runs = rle_runs(indexed.scan_row_major());

    let candidates = [
        (CandidateKind::Huffman, huffman_only(&runs, palette_codes)),
        (CandidateKind::RleFixed, rle_fixed(&runs, palette_codes)),
        (CandidateKind::RleHuffman, rle_huffman(&runs, palette_codes)?),
    ];

    let mut best: Option<(CandidateKind, BitWriter)> = None;
    for (kind, (header, sequence)) in candidates {
        let finalized = finalize(&header, &sequence, alignment);
        let better = match &best {
            None => true,
            Some((_, prev)) => finalized.len_bits() < prev.len_bits(),
        };
        if better {
            best = Some((kind, finalized));
        }
    }
    Ok(best.expect("exactly three candidates are always produced"))
}

fn finalize(header: &BitWriter, sequence: &BitWriter, policy: &AlignmentPolicy) -> BitWriter {
    let mut w = BitWriter::new();
    w.extend(header);
    if policy.align_header {
        w.pad_to_byte();
    }
    w.extend(sequence);
    if policy.align_sequence {
        w.pad_to_byte();
    }
    if policy.align_combined {
        w.pad_to_byte();
    }
    w
}

/// **A. Huffman-only**: header `"0"`, then `H[p]` repeated `count` times
/// for each run.
fn huffman_only(runs: &[(u8, u32)], codes: &HashMap<u8, Code>) -> (BitWriter, BitWriter) {
    let mut header = BitWriter::new();
    header.write_bits(0, 1);

    let mut sequence = BitWriter::new();
    for &(p, count) in runs {
        let code = codes[&p];
        for _ in 0..count {
            sequence.write_code(code);
        }
    }
    (header, sequence)
}

/// **B. RLE-fixed**: header `"10"` then `L - 1` in 5 bits; sequence is
/// `H[p]` followed by `count - 1` in exactly `L` bits per run.
fn rle_fixed(runs: &[(u8, u32)], codes: &HashMap<u8, Code>) -> (BitWriter, BitWriter) {
    let l = runs
        .iter()
        .map(|&(_, count)| bit_length((count - 1) as u64))
        .max()
        .unwrap_or(0)
        .max(1);

    let mut header = BitWriter::new();
    header.write_bits(0b10, 2);
    header.write_bits((l - 1) as u64, 5);

    let mut sequence = BitWriter::new();
    for &(p, count) in runs {
        sequence.write_code(codes[&p]);
        sequence.write_bits((count - 1) as u64, l);
    }
    (header, sequence)
}

/// **C. RLE+Huffman**: a Huffman codebook over the *distinct* `count - 1`
/// values, all weighted 1 (uniform over distinct values, ignoring how
/// often each count actually occurs - preserved intentionally for
/// bit-exact compatibility with the source format, not "fixed").
fn rle_huffman(
    runs: &[(u8, u32)],
    codes: &HashMap<u8, Code>,
) -> Result<(BitWriter, BitWriter)> {
    let mut uniform_freqs: HashMap<u32, u64> = HashMap::new();
    for &(_, count) in runs {
        uniform_freqs.insert(count - 1, 1);
    }
    let count_codes = huffman::build(&uniform_freqs, RLE_COUNT_MAX_LENGTH)?;

    let mut entries: Vec<u32> = uniform_freqs.keys().copied().collect();
    entries.sort_unstable();

    let num_entries = entries.len() as u64;
    let num_entries_bit_length = bit_length(num_entries);
    let max_value = *entries.last().expect("at least one run per frame");
    // `.max(1)`: when every run has count 1, `max_value` is 0 and
    // `bit_length(0) == 0`, which would otherwise make this field a
    // zero-bit slot. Mirrors `max(1, max_value.bit_length())` in the
    // source this header format is ported from.
    let max_value_bit_length = bit_length(max_value as u64).max(1);

    let mut header = BitWriter::new();
    header.write_bits(0b11, 2);
    header.write_bits(num_entries_bit_length as u64, 4);
    header.write_bits(num_entries, num_entries_bit_length);
    header.write_bits(max_value_bit_length as u64, 4);
    for &value in &entries {
        header.write_bits(value as u64, max_value_bit_length);
        let code = count_codes[&value];
        header.write_bits((code.len - 1) as u64, 4);
        header.write_code(code);
    }

    let mut sequence = BitWriter::new();
    for &(p, count) in runs {
        sequence.write_code(codes[&p]);
        sequence.write_code(count_codes[&(count - 1)]);
    }
    Ok((header, sequence))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::IndexedFrame;

    fn single_code_map() -> HashMap<u8, Code> {
        HashMap::from([(0u8, Code { bits: 0, len: 1 })])
    }

    #[test]
    fn solid_frame_selects_huffman_only() {
        let indexed = IndexedFrame::new(2, 2, vec![0, 0, 0, 0]);
        let codes = single_code_map();
        let (kind, bits) = encode_frame(&indexed, &codes, &AlignmentPolicy::default()).unwrap();
        assert_eq!(kind, CandidateKind::Huffman);
        // 1-bit header + four 1-bit codes = 5 bits, padded to one byte.
        assert_eq!(bits.into_bytes(), vec![0x00]);
    }

    #[test]
    fn long_run_forces_a_sixteen_bit_rle_field() {
        // 65536 repeats of palette index 0 and one repeat of index 1 force
        // bitlength(65536 - 1) == 16 in the RLE-fixed candidate.
        let mut indices = vec![0u8; 65536];
        indices.push(1);
        let indexed = IndexedFrame::new(65537, 1, indices);
        let codes = HashMap::from([
            (0u8, Code { bits: 0, len: 1 }),
            (1u8, Code { bits: 1, len: 1 }),
        ]);
        let runs = rle_runs(indexed.scan_row_major());
        let (header, _) = rle_fixed(&runs, &codes);
        assert_eq!(header.len_bits(), 7);
        assert_eq!(header.into_bytes(), vec![0b1001_1110]); // "10" + "01111" (L-1=15)
    }

    #[test]
    fn rle_huffman_header_round_trips_entry_count() {
        let runs = vec![(0u8, 1u32), (0u8, 2), (0u8, 3), (0u8, 4)];
        let codes = single_code_map();
        let (header, _) = rle_huffman(&runs, &codes).unwrap();
        assert!(header.len_bits() > 2);
    }

    #[test]
    fn rle_huffman_max_value_field_is_never_zero_width() {
        // Every run has count 1, so the distinct-value set is {0} and
        // `max_value` is 0; the field carrying its bit-length must still
        // come out at least 1 bit wide.
        let runs = vec![(0u8, 1u32), (0u8, 1), (0u8, 1)];
        let codes = single_code_map();
        let (header, _) = rle_huffman(&runs, &codes).unwrap();
        // "11" (2) + num_entries_bit_length (4) + num_entries (>=1) +
        // max_value_bit_length (4) + per-entry fields must all be present;
        // a zero-width max_value field would instead collapse the header.
        assert!(header.len_bits() >= 2 + 4 + 1 + 4);
    }
}
