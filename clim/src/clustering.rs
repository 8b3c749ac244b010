//! Temporal clustering: groups consecutive frames of a chunk into segments
//! that will each get their own palette.
//!
//! Two distinct distance computations are used and must not be conflated:
//! a cheap neighbor-to-neighbor metric chooses the target cluster count
//! `K`, while an expensive all-pairs MSE matrix is what Ward-linkage
//! agglomeration actually clusters on.

use crate::config::EncoderConfig;
use crate::error::Result;
use crate::frame::Frame;

/// Returns a strictly increasing list of frame indices, starting at 0,
/// where each value is the first frame of a new cluster.
pub fn segment_starts(frames: &[Frame], config: &EncoderConfig) -> Result<Vec<usize>> {
    let n = frames.len();
    if n < 2 {
        return Ok(vec![0]);
    }

    let neighbor_distances = neighbor_l2_distances(frames);
    let k = target_cluster_count(&neighbor_distances, config.clustering_threshold);
    let max_k = ((config.max_palette_segments_percent * n as f64).floor() as i64).max(1) as usize;
    let k = k.clamp(1, max_k.min(n));

    let condensed = pairwise_mse(frames);
    let labels = ward_linkage_labels(n, &condensed, k);

    let mut starts = vec![0];
    for i in 1..n {
        if labels[i] != labels[i - 1] {
            starts.push(i);
        }
    }
    Ok(starts)
}

/// `d_i` = mean over pixels of the L2 norm between corresponding RGB
/// vectors of frame `i` and frame `i+1`.
fn neighbor_l2_distances(frames: &[Frame]) -> Vec<f64> {
    frames
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0].pixels(), pair[1].pixels());
            let sum: f64 = a
                .iter()
                .zip(b.iter())
                .map(|(p, q)| {
                    let sq: f64 = (0..3)
                        .map(|c| {
                            let diff = p[c] as f64 - q[c] as f64;
                            diff * diff
                        })
                        .sum();
                    sq.sqrt()
                })
                .sum();
            sum / a.len() as f64
        })
        .collect()
}

/// Starting at 1, increments for every neighbor distance exceeding
/// `threshold * population_stddev(distances)`.
fn target_cluster_count(distances: &[f64], threshold: f64) -> usize {
    if distances.is_empty() {
        return 1;
    }
    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    let variance =
        distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / distances.len() as f64;
    let stddev = variance.sqrt();
    let threshold_dev = threshold * stddev;
    1 + distances.iter().filter(|&&d| d > threshold_dev).count()
}

/// Condensed (upper-triangular, i<j) pairwise mean squared error between
/// full-pixel RGB arrays.
fn pairwise_mse(frames: &[Frame]) -> Vec<Vec<f64>> {
    let n = frames.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (frames[i].pixels(), frames[j].pixels());
            let count = (a.len() * 3) as f64;
            let sum_sq: f64 = a
                .iter()
                .zip(b.iter())
                .map(|(p, q)| {
                    (0..3)
                        .map(|c| {
                            let diff = p[c] as f64 - q[c] as f64;
                            diff * diff
                        })
                        .sum::<f64>()
                })
                .sum();
            let mse = sum_sq / count;
            matrix[i][j] = mse;
            matrix[j][i] = mse;
        }
    }
    matrix
}

/// Agglomerative clustering with the Ward linkage update (Lance-Williams
/// formula), cutting the dendrogram at exactly `k` clusters. Returns one
/// label per original frame index, in `[0, k)`.
fn ward_linkage_labels(n: usize, condensed: &[Vec<f64>], k: usize) -> Vec<usize> {
    // Each active cluster is (members, size, distance-to-every-other-active-cluster).
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut dist = condensed.to_vec();
    let mut alive: Vec<usize> = (0..n).collect();

    while alive.len() > k.max(1) {
        // Find the closest pair among active clusters.
        let mut best = (f64::INFINITY, 0usize, 0usize);
        for (ai, &i) in alive.iter().enumerate() {
            for &j in &alive[ai + 1..] {
                if dist[i][j] < best.0 {
                    best = (dist[i][j], i, j);
                }
            }
        }
        let (_, i, j) = best;

        let ni = members[i].len() as f64;
        let nj = members[j].len() as f64;
        for &m in &alive {
            if m == i || m == j {
                continue;
            }
            let nk = members[m].len() as f64;
            let d_ik = dist[i][m];
            let d_jk = dist[j][m];
            let d_ij = dist[i][j];
            let updated = ((ni + nk) * d_ik + (nj + nk) * d_jk - nk * d_ij) / (ni + nj + nk);
            dist[i][m] = updated;
            dist[m][i] = updated;
        }

        let merged = std::mem::take(&mut members[j]);
        members[i].extend(merged);
        alive.retain(|&m| m != j);
    }

    let mut labels = vec![0usize; n];
    for (label, &cluster_id) in alive.iter().enumerate() {
        for &frame_index in &members[cluster_id] {
            labels[frame_index] = label;
        }
    }
    labels
}
