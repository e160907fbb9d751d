//! Chunks and partition scoring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A group of items assigned to one node, with the cached sum of their weights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub keys: Vec<String>,
    /// Sum of member weights in seconds.
    #[serde(rename = "total_seconds")]
    pub total: u64,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append an item and add its weight to the cached total.
    pub fn push(&mut self, key: String, weight: u64) {
        self.keys.push(key);
        self.total += weight;
    }

    /// Re-sum the total from the authoritative weight map.
    ///
    /// Keys missing from the map contribute zero.
    pub fn recompute_total(&mut self, weights: &HashMap<String, u64>) {
        self.total = self
            .keys
            .iter()
            .map(|k| weights.get(k).copied().unwrap_or(0))
            .sum();
    }
}

/// Balance score of a partition: largest chunk total minus smallest.
///
/// Empty chunks count with a total of zero. Lower is better, zero is a
/// perfect split. Uses cached totals only.
pub fn score(chunks: &[Chunk]) -> u64 {
    let Some(first) = chunks.first() else {
        return 0;
    };
    let (min, max) = chunks[1..]
        .iter()
        .fold((first.total, first.total), |(min, max), c| {
            (min.min(c.total), max.max(c.total))
        });
    max - min
}
