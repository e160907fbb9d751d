//! Test function discovery.
//!
//! Reads the `_test.go` files directly inside each package directory and
//! picks out top-level `func TestXxx(` declarations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

static TEST_FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^func\s+(Test[A-Za-z0-9_]*)\s*\(").expect("test function regex is valid")
});

/// Whether `name` is a test function `go test` would run.
///
/// `Test` alone and `TestMain` are excluded, as are names whose first
/// character after `Test` is lowercase.
pub fn is_test_function(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("Test") else {
        return false;
    };
    if rest.is_empty() || name == "TestMain" {
        return false;
    }
    !rest.starts_with(|c: char| c.is_ascii_lowercase())
}

/// Test function names declared in one Go source file, in order.
pub fn parse_test_functions(source: &str) -> Vec<String> {
    TEST_FUNC_RE
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .filter(|name| is_test_function(name))
        .collect()
}

/// Scan each package directory (relative to `root`) for test functions.
///
/// Results are keyed by the package path as given. Missing directories and
/// packages with an unreadable `_test.go` file are skipped with a warning.
/// Packages without any test functions are left out of the result.
pub fn scan_test_functions(root: &Path, packages: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut found = BTreeMap::new();

    'packages: for pkg in packages {
        let dir = root.join(pkg);
        if !dir.is_dir() {
            warn!(package = %pkg, "package directory does not exist, skipping");
            continue;
        }

        let mut functions = Vec::new();
        let files = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| {
                e.file_type().is_file() && e.file_name().to_string_lossy().ends_with("_test.go")
            });

        for entry in files {
            match std::fs::read_to_string(entry.path()) {
                Ok(source) => functions.extend(parse_test_functions(&source)),
                Err(e) => {
                    warn!(
                        package = %pkg,
                        file = %entry.path().display(),
                        error = %e,
                        "failed to read test file, skipping package"
                    );
                    continue 'packages;
                }
            }
        }

        if functions.is_empty() {
            info!(package = %pkg, "no test functions found");
        } else {
            info!(package = %pkg, count = functions.len(), "found test functions");
            found.insert(pkg.clone(), functions);
        }
    }

    info!(packages = found.len(), "scanned test functions");
    found
}
