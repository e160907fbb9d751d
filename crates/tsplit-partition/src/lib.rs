//! tsplit-partition: Split weighted items into duration-balanced chunks.
//!
//! Given `{item → seconds}` and a node count, produces exactly that many
//! chunks whose totals are as close to equal as the search can make them.
//! Every item lands in exactly one chunk.
//!
//! # Pipeline
//!
//! ```text
//! weights ──► greedy (shuffled, lightest-chunk-first)
//!         ──► anneal (relocate / swap moves, Metropolis acceptance)
//!         ──► totals recomputed from the weight map
//! ```
//!
//! # Components
//!
//! - **`chunk`**: `Chunk` and the max-minus-min `score`
//! - **`greedy`**: initial assignment
//! - **`anneal`**: simulated-annealing refinement and its move operators
//! - **`split`**: public entry points

pub mod anneal;
pub mod chunk;
pub mod error;
pub mod greedy;
pub mod split;

pub use anneal::{AnnealConfig, anneal};
pub use chunk::{Chunk, score};
pub use error::{PartitionError, PartitionResult};
pub use greedy::greedy_partition;
pub use split::{split_balanced, split_durations};
