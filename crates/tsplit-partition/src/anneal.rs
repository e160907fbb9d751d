//! Simulated-annealing refinement.
//!
//! Starting from an initial partition, repeatedly proposes a neighbour by
//! either relocating one item or swapping two items between chunks, and
//! accepts it under the Metropolis criterion with a geometrically cooling
//! temperature. The best partition seen is returned.
//!
//! Candidate scores are computed from the two affected chunk totals without
//! touching the working partition; only accepted moves are applied. All
//! totals are integer seconds, so the incremental totals are exactly the
//! values a full re-sum would produce.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{Chunk, score};
use crate::error::{PartitionError, PartitionResult};

/// Iteration budget and temperature schedule for the annealer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Number of candidate moves to draw.
    pub iterations: usize,
    /// Temperature at iteration 0.
    pub temp_start: f64,
    /// Temperature approached at the final iteration.
    pub temp_end: f64,
    /// Fixed seed for the random stream. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            iterations: 50_000,
            temp_start: 1000.0,
            temp_end: 0.01,
            seed: None,
        }
    }
}

impl AnnealConfig {
    /// Reject schedules the cooling formula cannot evaluate.
    pub fn validate(&self) -> PartitionResult<()> {
        let temps = [("temp_start", self.temp_start), ("temp_end", self.temp_end)];
        for (name, value) in temps {
            if !value.is_finite() || value <= 0.0 {
                return Err(PartitionError::InvalidSchedule(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Temperature at iteration `i`: `start * (end / start)^(i / N)`.
    pub fn temperature(&self, i: usize) -> f64 {
        if self.iterations == 0 {
            return self.temp_start;
        }
        let progress = i as f64 / self.iterations as f64;
        self.temp_start * (self.temp_end / self.temp_start).powf(progress)
    }

    /// A fresh random stream for one partitioning call.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// A neighbour move between two distinct chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Move `keys[index]` of chunk `from` to the end of chunk `to`.
    Relocate {
        from: usize,
        index: usize,
        to: usize,
    },
    /// Exchange `keys[ia]` of chunk `a` with `keys[ib]` of chunk `b`.
    Swap {
        a: usize,
        ia: usize,
        b: usize,
        ib: usize,
    },
}

/// Draw a random move. Degenerate draws (empty chunk, same chunk twice)
/// yield `None`.
fn propose<R: Rng + ?Sized>(chunks: &[Chunk], rng: &mut R) -> Option<Move> {
    let n = chunks.len();
    if rng.random_bool(0.5) {
        let from = rng.random_range(0..n);
        if chunks[from].is_empty() {
            return None;
        }
        let to = rng.random_range(0..n);
        if from == to {
            return None;
        }
        let index = rng.random_range(0..chunks[from].len());
        Some(Move::Relocate { from, index, to })
    } else {
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);
        if a == b || chunks[a].is_empty() || chunks[b].is_empty() {
            return None;
        }
        let ia = rng.random_range(0..chunks[a].len());
        let ib = rng.random_range(0..chunks[b].len());
        Some(Move::Swap { a, ia, b, ib })
    }
}

fn weight_of(weights: &HashMap<String, u64>, key: &str) -> u64 {
    weights.get(key).copied().unwrap_or(0)
}

/// New totals of the two chunks a move touches, as `[(index, total); 2]`.
///
/// Cached totals always include the moved item's weight, so the
/// subtractions cannot underflow.
fn totals_after(chunks: &[Chunk], mv: Move, weights: &HashMap<String, u64>) -> [(usize, u64); 2] {
    match mv {
        Move::Relocate { from, index, to } => {
            let w = weight_of(weights, &chunks[from].keys[index]);
            [(from, chunks[from].total - w), (to, chunks[to].total + w)]
        }
        Move::Swap { a, ia, b, ib } => {
            let wa = weight_of(weights, &chunks[a].keys[ia]);
            let wb = weight_of(weights, &chunks[b].keys[ib]);
            [(a, chunks[a].total - wa + wb), (b, chunks[b].total - wb + wa)]
        }
    }
}

/// Score of the partition with two chunk totals replaced.
fn score_with(chunks: &[Chunk], changed: [(usize, u64); 2]) -> u64 {
    let mut min = u64::MAX;
    let mut max = 0;
    for (i, c) in chunks.iter().enumerate() {
        let total = changed
            .iter()
            .find(|(idx, _)| *idx == i)
            .map_or(c.total, |(_, t)| *t);
        min = min.min(total);
        max = max.max(total);
    }
    max - min
}

fn apply(chunks: &mut [Chunk], mv: Move, changed: [(usize, u64); 2]) {
    match mv {
        Move::Relocate { from, index, to } => {
            let key = chunks[from].keys.remove(index);
            chunks[to].keys.push(key);
        }
        Move::Swap { a, ia, b, ib } => {
            let ((lo, ilo), (hi, ihi)) = if a < b {
                ((a, ia), (b, ib))
            } else {
                ((b, ib), (a, ia))
            };
            let (left, right) = chunks.split_at_mut(hi);
            std::mem::swap(&mut left[lo].keys[ilo], &mut right[0].keys[ihi]);
        }
    }
    for (idx, total) in changed {
        chunks[idx].total = total;
    }
}

/// Refine a partition with simulated annealing.
///
/// Totals of `initial` are recomputed from `weights` before the search.
/// Returns the lowest-scoring partition encountered, which never scores
/// worse than `initial`. The weights of all keys must sum within `u64`;
/// [`split_balanced`](crate::split_balanced) checks this before calling.
pub fn anneal<R: Rng + ?Sized>(
    initial: &[Chunk],
    weights: &HashMap<String, u64>,
    config: &AnnealConfig,
    rng: &mut R,
) -> Vec<Chunk> {
    let mut current = initial.to_vec();
    for chunk in &mut current {
        chunk.recompute_total(weights);
    }
    let mut current_score = score(&current);

    if current.len() < 2 || config.iterations == 0 {
        return current;
    }

    let initial_score = current_score;
    let mut best = current.clone();
    let mut best_score = current_score;
    let mut accepted = 0usize;
    let mut skipped = 0usize;

    for i in 0..config.iterations {
        let t = config.temperature(i);

        let Some(mv) = propose(&current, rng) else {
            skipped += 1;
            continue;
        };

        let changed = totals_after(&current, mv, weights);
        let candidate_score = score_with(&current, changed);
        let delta = candidate_score as f64 - current_score as f64;

        if delta < 0.0 || rng.random::<f64>() < (-delta / t).exp() {
            apply(&mut current, mv, changed);
            current_score = candidate_score;
            accepted += 1;
        }

        if current_score < best_score {
            best = current.clone();
            best_score = current_score;
            if best_score == 0 {
                debug!(iteration = i, "reached perfect balance");
            }
        }
    }

    debug!(
        initial_score,
        best_score,
        accepted,
        skipped,
        iterations = config.iterations,
        "annealing finished"
    );

    best
}
