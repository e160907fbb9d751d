//! Shared types used across tsplit crates.

use std::collections::HashMap;
use std::time::Duration;

/// Fallback duration for tests with no recorded history.
pub const DEFAULT_TEST_DURATION: Duration = Duration::from_secs(5);

/// A single test function and the duration used to schedule it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInfo {
    pub package: String,
    pub function: String,
    pub duration: Duration,
}

impl TestInfo {
    /// Partition key: `"<package>:<function>"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.package, self.function)
    }
}

/// Split a partition key back into `(package, function)`.
///
/// Splits at the first `:`; keys without one map to an empty function.
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once(':').unwrap_or((key, ""))
}

/// Weight map for the partitioner, in whole seconds.
pub fn weight_map(tests: &[TestInfo]) -> HashMap<String, u64> {
    tests
        .iter()
        .map(|t| (t.key(), t.duration.as_secs()))
        .collect()
}

/// Test binary file name for a package: `api/service/foo` → `api.service.foo.test`.
///
/// The module root package (`.`) is named `root.test`.
pub fn binary_name(package: &str) -> String {
    let trimmed = package.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return "root.test".to_string();
    }
    format!("{}.test", trimmed.replace('/', "."))
}
