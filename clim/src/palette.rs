//! Palette construction: weighted k-means over a cluster's unique colors.
//!
//! Operates over *unique* integer RGB tuples with their occurrence counts
//! as per-sample weights (not over raw floating-point pixel values), using
//! a fixed deterministic random seed so repeated runs over the same input
//! are byte-identical.

use std::collections::HashMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::EncoderConfig;
use crate::error::{Error, Result};
use crate::frame::{Frame, IndexedFrame};

/// Fixed k-means seed, chosen purely for reproducibility (mirrors the
/// original implementation's fixed random state).
const KMEANS_SEED: u64 = 42;
const KMEANS_MAX_ITERS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Builds a palette for the pixels of `frames[range]` and rewrites each
/// frame in that range to a palette-indexed [`IndexedFrame`]. The input
/// frames are left untouched.
pub fn build_palette(
    frames: &[Frame],
    range: std::ops::Range<usize>,
    config: &EncoderConfig,
) -> Result<(Palette, Vec<IndexedFrame>)> {
    let cluster_frames = &frames[range];
    if cluster_frames.is_empty() {
        return Err(Error::invariant("cannot build a palette for an empty cluster"));
    }

    let mut counts: HashMap<[u8; 3], u64> = HashMap::new();
    for frame in cluster_frames {
        for &pixel in frame.pixels() {
            *counts.entry(pixel).or_insert(0) += 1;
        }
    }

    let mut unique: Vec<([u8; 3], u64)> = counts.into_iter().collect();
    unique.sort_unstable_by_key(|&(color, _)| color);

    let k = unique.len().min(config.max_palette_colors as usize).max(1);
    let assignment = weighted_kmeans(&unique, k);

    let color_to_label: HashMap<[u8; 3], u8> = unique
        .iter()
        .map(|&(color, _)| color)
        .zip(assignment.pixel_labels.iter().copied())
        .collect();

    let indexed_frames = cluster_frames
        .iter()
        .map(|frame| {
            let indices: Vec<u8> = frame
                .pixels()
                .iter()
                .map(|p| color_to_label[p])
                .collect();
            IndexedFrame::new(frame.width, frame.height, indices)
        })
        .collect();

    Ok((
        Palette {
            colors: assignment.centers,
        },
        indexed_frames,
    ))
}

struct Assignment {
    centers: Vec<[u8; 3]>,
    /// One palette label per entry of the `unique` vector passed in.
    pixel_labels: Vec<u8>,
}

/// Weighted k-means over unique colors, `count` as weight. Returns rounded
/// integer RGB centers and, for every unique input color, the palette
/// index it was assigned to. Clusters that end up with no assigned weight
/// are dropped so every returned palette index is actually used, per the
/// "palette covers exactly the colors used" invariant.
fn weighted_kmeans(unique: &[([u8; 3], u64)], k: usize) -> Assignment {
    let mut rng = ChaCha8Rng::seed_from_u64(KMEANS_SEED);

    if k >= unique.len() {
        // Every unique color is its own center; no iteration needed.
        let centers = unique.iter().map(|&(c, _)| c).collect();
        let pixel_labels = (0..unique.len() as u8).collect();
        return Assignment { centers, pixel_labels };
    }

    let mut centers: Vec<[f64; 3]> = weighted_sample_without_replacement(unique, k, &mut rng)
        .into_iter()
        .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
        .collect();

    let mut labels = vec![0usize; unique.len()];
    for _ in 0..KMEANS_MAX_ITERS {
        let mut changed = false;
        for (i, &(color, _)) in unique.iter().enumerate() {
            let point = [color[0] as f64, color[1] as f64, color[2] as f64];
            let mut best = (f64::INFINITY, 0usize);
            for (ci, center) in centers.iter().enumerate() {
                let dist = sq_dist(&point, center);
                if dist < best.0 {
                    best = (dist, ci);
                }
            }
            if labels[i] != best.1 {
                changed = true;
            }
            labels[i] = best.1;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut weights = vec![0.0f64; k];
        for (i, &(color, count)) in unique.iter().enumerate() {
            let w = count as f64;
            let label = labels[i];
            weights[label] += w;
            for c in 0..3 {
                sums[label][c] += color[c] as f64 * w;
            }
        }
        for (ci, center) in centers.iter_mut().enumerate() {
            if weights[ci] > 0.0 {
                for c in 0..3 {
                    center[c] = sums[ci][c] / weights[ci];
                }
            }
        }

        if !changed {
            break;
        }
    }

    // Drop empty clusters and renumber remaining ones contiguously.
    let mut used: Vec<usize> = labels.clone();
    used.sort_unstable();
    used.dedup();
    let remap: HashMap<usize, u8> = used
        .iter()
        .enumerate()
        .map(|(new_label, &old_label)| (old_label, new_label as u8))
        .collect();

    let pixel_labels = labels.iter().map(|l| remap[l]).collect();
    let final_centers = used
        .iter()
        .map(|&old| {
            let c = centers[old];
            [
                c[0].round().clamp(0.0, 255.0) as u8,
                c[1].round().clamp(0.0, 255.0) as u8,
                c[2].round().clamp(0.0, 255.0) as u8,
            ]
        })
        .collect();

    Assignment {
        centers: final_centers,
        pixel_labels,
    }
}

fn sq_dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (0..3).map(|c| (a[c] - b[c]).powi(2)).sum()
}

/// Draws `k` distinct indices from `unique` without replacement, with
/// selection probability proportional to `count`.
fn weighted_sample_without_replacement(
    unique: &[([u8; 3], u64)],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<[u8; 3]> {
    let mut remaining: Vec<([u8; 3], u64)> = unique.to_vec();
    let mut picked = Vec::with_capacity(k);
    for _ in 0..k {
        let total: u64 = remaining.iter().map(|&(_, w)| w).sum();
        let mut threshold = rng.random_range(0..total.max(1));
        let mut idx = 0;
        for (i, &(_, w)) in remaining.iter().enumerate() {
            if threshold < w {
                idx = i;
                break;
            }
            threshold -= w;
        }
        picked.push(remaining.swap_remove(idx).0);
    }
    picked
}
