//! Greedy initial assignment.
//!
//! Items are shuffled first so repeated runs start the annealer from
//! different basins, then each one goes to the currently lightest chunk.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::chunk::Chunk;

/// Build an initial partition of `node_count` chunks.
///
/// Each entry (in shuffled order) is appended to the chunk with the smallest
/// running total; ties go to the lowest index. Surplus chunks stay empty.
pub fn greedy_partition<R: Rng + ?Sized>(
    mut entries: Vec<(String, u64)>,
    node_count: usize,
    rng: &mut R,
) -> Vec<Chunk> {
    entries.shuffle(rng);

    let mut chunks = vec![Chunk::default(); node_count];
    if chunks.is_empty() {
        return chunks;
    }

    for (key, weight) in entries {
        let lightest = lightest_chunk(&chunks);
        chunks[lightest].push(key, weight);
    }
    chunks
}

/// Index of the chunk with the smallest total, lowest index on ties.
fn lightest_chunk(chunks: &[Chunk]) -> usize {
    let mut best = 0;
    for (i, c) in chunks.iter().enumerate().skip(1) {
        if c.total < chunks[best].total {
            best = i;
        }
    }
    best
}
