//! Run summary, printed as text or JSON.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tsplit_partition::{Chunk, score};

#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub node_index: usize,
    pub tests: usize,
    pub total_seconds: u64,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub nodes: Vec<NodeSummary>,
    /// Largest minus smallest node total, in seconds.
    pub score: u64,
    pub scripts_dir: PathBuf,
    pub scripts: Vec<PathBuf>,
}

impl Summary {
    pub fn new(chunks: &[Chunk], scripts: Vec<PathBuf>, scripts_dir: &Path) -> Self {
        let nodes = chunks
            .iter()
            .enumerate()
            .map(|(node_index, c)| NodeSummary {
                node_index,
                tests: c.len(),
                total_seconds: c.total,
                keys: c.keys.clone(),
            })
            .collect();
        Self {
            nodes,
            score: score(chunks),
            scripts_dir: scripts_dir.to_path_buf(),
            scripts,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.nodes.iter().map(|n| n.total_seconds).sum()
    }
}

/// Human-readable per-node table.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<6} {:>7} {:>12}\n", "NODE", "TESTS", "ESTIMATED"));
    for node in &summary.nodes {
        out.push_str(&format!(
            "{:<6} {:>7} {:>11}s\n",
            node.node_index, node.tests, node.total_seconds
        ));
    }
    out.push_str(&format!(
        "\nTotal: {}s across {} nodes (spread {}s)\n",
        summary.total_seconds(),
        summary.nodes.len(),
        summary.score
    ));
    out.push_str(&format!(
        "Generated {} test script files in {}\n",
        summary.scripts.len(),
        summary.scripts_dir.display()
    ));
    out
}
