//! Join discovered tests with their duration history.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info};
use tsplit_core::TestInfo;

use crate::history::DurationHistory;

/// One [`TestInfo`] per discovered function.
///
/// A recorded non-zero duration is used when available; everything else
/// gets `default`.
pub fn collect_tests(
    functions: &BTreeMap<String, Vec<String>>,
    history: &DurationHistory,
    default: Duration,
) -> Vec<TestInfo> {
    let mut tests = Vec::new();
    let mut defaulted = 0usize;

    for (package, funcs) in functions {
        for function in funcs {
            let duration = match history.lookup(package, function) {
                Some(d) if !d.is_zero() => d,
                _ => {
                    debug!(
                        package = %package,
                        function = %function,
                        "no history, using default duration"
                    );
                    defaulted += 1;
                    default
                }
            };
            tests.push(TestInfo {
                package: package.clone(),
                function: function.clone(),
                duration,
            });
        }
    }

    info!(tests = tests.len(), defaulted, "collected test weights");
    tests
}
