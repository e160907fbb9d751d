//! Public entry points.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::anneal::{AnnealConfig, anneal};
use crate::chunk::{Chunk, score};
use crate::error::{PartitionError, PartitionResult};
use crate::greedy::greedy_partition;

/// Split `{item → seconds}` into exactly `node_count` balanced chunks.
///
/// Runs a shuffled greedy assignment, refines it with simulated annealing
/// under `config`, and recomputes every chunk total from `weights` before
/// returning. An empty map yields `node_count` empty chunks.
///
/// Fails with [`PartitionError::WeightOverflow`] when the weights do not sum
/// within `u64`; below that bound no chunk total can overflow.
pub fn split_balanced(
    weights: &HashMap<String, u64>,
    node_count: usize,
    config: &AnnealConfig,
) -> PartitionResult<Vec<Chunk>> {
    if node_count < 1 {
        return Err(PartitionError::InvalidNodeCount(node_count));
    }
    config.validate()?;
    let total_seconds = total_weight(weights)?;

    let mut rng = config.rng();
    let entries: Vec<(String, u64)> = weights.iter().map(|(k, w)| (k.clone(), *w)).collect();

    let initial = greedy_partition(entries, node_count, &mut rng);
    let greedy_score = score(&initial);
    debug!(items = weights.len(), node_count, greedy_score, "greedy assignment done");

    let mut chunks = anneal(&initial, weights, config, &mut rng);
    for chunk in &mut chunks {
        chunk.recompute_total(weights);
    }

    info!(
        items = weights.len(),
        node_count,
        total_seconds,
        greedy_score,
        final_score = score(&chunks),
        "partitioned items"
    );

    Ok(chunks)
}

fn total_weight(weights: &HashMap<String, u64>) -> PartitionResult<u64> {
    weights
        .values()
        .try_fold(0u64, |acc, w| acc.checked_add(*w))
        .ok_or(PartitionError::WeightOverflow {
            items: weights.len(),
        })
}

/// Like [`split_balanced`], taking durations truncated to whole seconds.
///
/// Later entries for a repeated key replace earlier ones.
pub fn split_durations<I>(
    durations: I,
    node_count: usize,
    config: &AnnealConfig,
) -> PartitionResult<Vec<Chunk>>
where
    I: IntoIterator<Item = (String, Duration)>,
{
    let weights: HashMap<String, u64> = durations
        .into_iter()
        .map(|(k, d)| (k, d.as_secs()))
        .collect();
    split_balanced(&weights, node_count, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn weights(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    fn seeded(seed: u64) -> AnnealConfig {
        AnnealConfig {
            iterations: 10_000,
            seed: Some(seed),
            ..AnnealConfig::default()
        }
    }

    /// Every key exactly once and totals add up.
    fn assert_conserved(input: &HashMap<String, u64>, chunks: &[Chunk]) {
        let mut seen = HashSet::new();
        for c in chunks {
            for k in &c.keys {
                assert!(seen.insert(k.clone()), "duplicate key: {k}");
            }
        }
        assert_eq!(seen.len(), input.len(), "not all keys assigned");
        assert_eq!(
            chunks.iter().map(|c| c.total).sum::<u64>(),
            input.values().sum::<u64>(),
            "total duration mismatch"
        );
    }

    #[test]
    fn basic_two_nodes() {
        let input = weights(&[("a", 3), ("b", 2), ("c", 1), ("d", 4)]);
        let chunks = split_balanced(&input, 2, &seeded(1)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_conserved(&input, &chunks);
        assert!(score(&chunks) <= 4);
    }

    #[test]
    fn more_nodes_than_items() {
        let input = weights(&[("a", 1), ("b", 2)]);
        let chunks = split_balanced(&input, 3, &seeded(2)).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_conserved(&input, &chunks);
        let empty = chunks.iter().filter(|c| c.is_empty()).count();
        assert!((1..=2).contains(&empty));
        assert!(chunks.iter().filter(|c| c.is_empty()).all(|c| c.total == 0));
    }

    #[test]
    fn one_node_takes_everything() {
        let input = weights(&[("a", 1), ("b", 2)]);
        let chunks = split_balanced(&input, 1, &seeded(3)).unwrap();

        assert_eq!(chunks.len(), 1);
        let mut keys = chunks[0].keys.clone();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(chunks[0].total, 3);
    }

    #[test]
    fn ten_items_five_nodes_balance_closely() {
        let input: HashMap<String, u64> = (1..=10).map(|w| (format!("t{w}"), w)).collect();
        let chunks = split_balanced(&input, 5, &AnnealConfig::default()).unwrap();

        assert_eq!(chunks.len(), 5);
        assert_conserved(&input, &chunks);
        assert!(
            score(&chunks) <= 3,
            "chunk total diff too large: {}",
            score(&chunks)
        );
    }

    #[test]
    fn empty_input_yields_empty_chunks() {
        let chunks = split_balanced(&HashMap::new(), 4, &seeded(4)).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.is_empty() && c.total == 0));
    }

    #[test]
    fn zero_node_count_fails_fast() {
        let input = weights(&[("a", 1)]);
        assert_eq!(
            split_balanced(&input, 0, &seeded(5)),
            Err(PartitionError::InvalidNodeCount(0))
        );
    }

    #[test]
    fn invalid_schedule_is_rejected() {
        let cfg = AnnealConfig {
            temp_start: -1.0,
            ..seeded(6)
        };
        assert!(matches!(
            split_balanced(&weights(&[("a", 1)]), 2, &cfg),
            Err(PartitionError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn zero_weights_are_assigned() {
        let input = weights(&[("a", 0), ("b", 0), ("c", 5)]);
        let chunks = split_balanced(&input, 2, &seeded(7)).unwrap();
        assert_conserved(&input, &chunks);
    }

    #[test]
    fn many_items_few_nodes() {
        let input: HashMap<String, u64> = (0..500)
            .map(|i| (format!("pkg:Test{i}"), i % 37 + 1))
            .collect();
        let chunks = split_balanced(&input, 3, &seeded(8)).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_conserved(&input, &chunks);
        assert!(score(&chunks) <= 37);
    }

    #[test]
    fn repeated_calls_keep_structure() {
        let input: HashMap<String, u64> = (1..=20).map(|w| (format!("t{w}"), w * 3)).collect();
        for _ in 0..5 {
            let cfg = AnnealConfig {
                iterations: 2_000,
                ..AnnealConfig::default()
            };
            let chunks = split_balanced(&input, 4, &cfg).unwrap();
            assert_eq!(chunks.len(), 4);
            assert_conserved(&input, &chunks);
        }
    }

    #[test]
    fn average_gap_stays_under_largest_item() {
        // Greedy alone already keeps the gap within the largest item; the
        // annealer must not lose that, and on average should do better.
        let input: HashMap<String, u64> = (1..=10).map(|w| (format!("t{w}"), w)).collect();
        let runs = 30;
        let mut refined_total = 0;
        let mut greedy_total = 0;

        for seed in 0..runs {
            let cfg = AnnealConfig {
                iterations: 3_000,
                seed: Some(seed),
                ..AnnealConfig::default()
            };
            let mut rng = cfg.rng();
            let entries: Vec<_> = input.iter().map(|(k, w)| (k.clone(), *w)).collect();
            let initial = greedy_partition(entries, 5, &mut rng);
            let refined = anneal(&initial, &input, &cfg, &mut rng);

            greedy_total += score(&initial);
            refined_total += score(&refined);
        }

        assert!(refined_total <= greedy_total);
        assert!(refined_total / runs <= 10);
    }

    #[test]
    fn durations_truncate_to_seconds() {
        let durations = vec![
            ("a".to_string(), Duration::from_millis(2_900)),
            ("b".to_string(), Duration::from_secs(4)),
        ];
        let chunks = split_durations(durations, 1, &seeded(10)).unwrap();
        assert_eq!(chunks[0].total, 6);
    }

    #[test]
    fn overflowing_weights_are_rejected() {
        let half = u64::MAX / 2 + 1;
        let input = weights(&[("a", half), ("b", half)]);
        assert_eq!(
            split_balanced(&input, 1, &seeded(11)),
            Err(PartitionError::WeightOverflow { items: 2 })
        );

        let durations = vec![
            ("a".to_string(), Duration::MAX),
            ("b".to_string(), Duration::MAX),
        ];
        assert_eq!(
            split_durations(durations, 2, &seeded(12)),
            Err(PartitionError::WeightOverflow { items: 2 })
        );
    }

    #[test]
    fn weights_summing_to_max_still_split() {
        let input = weights(&[("a", u64::MAX - 1), ("b", 1)]);
        let chunks = split_balanced(&input, 2, &seeded(13)).unwrap();
        assert_conserved(&input, &chunks);
        assert_eq!(score(&chunks), u64::MAX - 2);
    }

    #[test]
    fn concurrent_callers_are_independent() {
        let input: HashMap<String, u64> = (1..=30).map(|w| (format!("t{w}"), w)).collect();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let input = input.clone();
                std::thread::spawn(move || {
                    let cfg = AnnealConfig {
                iterations: 2_000,
                ..AnnealConfig::default()
            };
                    split_balanced(&input, 3, &cfg).unwrap()
                })
            })
            .collect();

        for h in handles {
            let chunks = h.join().unwrap();
            assert_conserved(&input, &chunks);
        }
    }
}
