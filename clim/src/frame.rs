//! Raw RGB frames, quantized (palette-indexed) frames, and the scanner that
//! turns a 2D pixel grid into the linear run-length sequence the encoding
//! selector operates on.

use crate::error::{Error, Result};

/// A single decoded picture: `width * height` RGB triples in row-major
/// order. Produced by an external frame source; consumed once per encode.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::input("frame dimensions must be positive"));
        }
        if pixels.len() != (width as usize) * (height as usize) {
            return Err(Error::input(format!(
                "expected {} pixels for a {width}x{height} frame, got {}",
                width as usize * height as usize,
                pixels.len()
            )));
        }
        Ok(Frame { width, height, pixels })
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }
}

/// A palette-quantized frame: one index per pixel into the owning
/// cluster's [`crate::palette::Palette`]. Kept as a distinct type so that
/// quantization never mutates the caller's [`Frame`] in place.
#[derive(Debug, Clone)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    indices: Vec<u8>,
}

impl IndexedFrame {
    pub fn new(width: u32, height: u32, indices: Vec<u8>) -> Self {
        debug_assert_eq!(indices.len(), width as usize * height as usize);
        IndexedFrame { width, height, indices }
    }

    /// Scans the frame row-major, yielding the same pixel sequence the
    /// frame was stored in (storage is already row-major, so this is the
    /// identity view - kept as an explicit step since the format treats
    /// "scan order" as a distinct concept from storage order).
    pub fn scan_row_major(&self) -> &[u8] {
        &self.indices
    }
}

/// Coalesces a scanned index sequence into `(palette_index, run_length)`
/// pairs. Every run has `run_length >= 1`.
pub fn rle_runs(scanned: &[u8]) -> Vec<(u8, u32)> {
    let mut runs = Vec::new();
    let mut iter = scanned.iter();
    let Some(&first) = iter.next() else {
        return runs;
    };
    let mut current = first;
    let mut count: u32 = 1;
    for &value in iter {
        if value == current {
            count += 1;
        } else {
            runs.push((current, count));
            current = value;
            count = 1;
        }
    }
    runs.push((current, count));
    runs
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn rejects_mismatched_pixel_count() {
        assert!(Frame::new(2, 2, vec![[0, 0, 0]]).is_err());
    }

    #[test]
    fn rle_coalesces_consecutive_equal_indices() {
        let runs = rle_runs(&[1, 1, 1, 2, 2, 1]);
        assert_eq!(runs, vec![(1, 3), (2, 2), (1, 1)]);
    }

    #[test]
    fn rle_of_expansion_is_idempotent() {
        let runs = rle_runs(&[5, 5, 5, 7]);
        let expanded: Vec<u8> = runs
            .iter()
            .flat_map(|&(v, c)| std::iter::repeat_n(v, c as usize))
            .collect();
        assert_eq!(rle_runs(&expanded), runs);
    }

    #[test]
    fn empty_scan_has_no_runs() {
        assert!(rle_runs(&[]).is_empty());
    }

    /// §8 property 5: re-running RLE on an already run-length-expanded
    /// sequence yields identical runs, for any scanned index sequence.
    #[test]
    fn rle_is_idempotent_on_arbitrary_sequences() {
        arbtest::arbtest(|u| {
            let len = u.int_in_range(0usize..=200)?;
            let mut scanned = Vec::with_capacity(len);
            for _ in 0..len {
                scanned.push(u.int_in_range(0u8..=4)?);
            }

            let runs = rle_runs(&scanned);
            assert!(runs.iter().all(|&(_, count)| count >= 1));

            let expanded: Vec<u8> = runs
                .iter()
                .flat_map(|&(v, c)| std::iter::repeat_n(v, c as usize))
                .collect();
            assert_eq!(expanded, scanned);
            assert_eq!(rle_runs(&expanded), runs);

            Ok(())
        });
    }
}
