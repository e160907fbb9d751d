//! Per-node test groupings.

use std::collections::BTreeMap;

use serde::Serialize;
use tsplit_core::{binary_name, split_key};
use tsplit_partition::Chunk;

/// Tests assigned to one node, grouped by package.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTests {
    pub node_index: usize,
    pub total_seconds: u64,
    /// Package → test functions, in chunk order.
    pub funcs: BTreeMap<String, Vec<String>>,
}

/// One invocation of a package's test binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestLine {
    pub package: String,
    pub binary: String,
    /// Anchored `-test.run` regex, e.g. `^(TestA|TestB)$`.
    pub test_pattern: String,
    pub flags: String,
}

impl NodeTests {
    /// One `NodeTests` per chunk, indexed from zero.
    pub fn from_chunks(chunks: &[Chunk]) -> Vec<NodeTests> {
        chunks
            .iter()
            .enumerate()
            .map(|(node_index, chunk)| {
                let mut funcs: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for key in &chunk.keys {
                    let (pkg, func) = split_key(key);
                    funcs.entry(pkg.to_string()).or_default().push(func.to_string());
                }
                NodeTests {
                    node_index,
                    total_seconds: chunk.total,
                    funcs,
                }
            })
            .collect()
    }

    pub fn function_count(&self) -> usize {
        self.funcs.values().map(Vec::len).sum()
    }

    /// Test lines for this node.
    ///
    /// With `max_functions > 0` each package's functions are cut into
    /// contiguous groups of at most that many; otherwise one line per
    /// package.
    pub fn test_lines(&self, max_functions: usize, flags: &str) -> Vec<TestLine> {
        let mut lines = Vec::new();
        for (package, funcs) in &self.funcs {
            let group = if max_functions > 0 {
                max_functions
            } else {
                funcs.len().max(1)
            };
            for names in funcs.chunks(group) {
                lines.push(TestLine {
                    package: package.clone(),
                    binary: binary_name(package),
                    test_pattern: format!("^({})$", names.join("|")),
                    flags: flags.to_string(),
                });
            }
        }
        lines
    }
}
