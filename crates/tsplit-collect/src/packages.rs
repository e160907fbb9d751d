//! Package discovery.
//!
//! Packages come either from a newline-separated list (usually stdin) or
//! from `go list -test ./...`, which reports a `<import path>.test` entry
//! for every package that has test files.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{CollectError, CollectResult};

const GO_LIST_FORMAT: &str =
    r#"{"Name":"{{ .Name }}","Dir":"{{ .Dir }}","Root":"{{ .Root }}","ImportPath":"{{ .ImportPath }}"}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListEntry {
    dir: PathBuf,
    root: PathBuf,
    import_path: String,
}

/// Read one package path per line, skipping blank lines.
pub fn read_packages<R: BufRead>(reader: R) -> CollectResult<Vec<String>> {
    let mut packages = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| CollectError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
        let pkg = line.trim();
        if !pkg.is_empty() {
            packages.push(pkg.to_string());
        }
    }
    info!(count = packages.len(), "read package list");
    Ok(packages)
}

/// Discover testable packages under `root` with `go list`.
///
/// Returns package directories relative to the module root, skipping any
/// whose import path matches `exclude`.
pub fn scan_packages(root: &Path, exclude: Option<&str>) -> CollectResult<Vec<String>> {
    let exclude = exclude
        .filter(|p| !p.is_empty())
        .map(Regex::new)
        .transpose()?;

    let mut cmd = Command::new("go");
    cmd.args(["list", "-test", "-f", GO_LIST_FORMAT, "./..."])
        .current_dir(root);
    debug!("Running: {:?}", cmd);

    let output = cmd.output().map_err(|e| CollectError::GoList(e.to_string()))?;
    if !output.status.success() {
        return Err(CollectError::GoList(format!(
            "exit code {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let packages = parse_go_list(&String::from_utf8_lossy(&output.stdout), exclude.as_ref())?;
    info!(count = packages.len(), "scanned Go packages");
    Ok(packages)
}

/// Parse `go list` JSON lines into relative package directories.
pub fn parse_go_list(output: &str, exclude: Option<&Regex>) -> CollectResult<Vec<String>> {
    let mut packages = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let entry: GoListEntry = serde_json::from_str(line)?;
        if !entry.import_path.ends_with(".test") {
            continue;
        }
        if exclude.is_some_and(|re| re.is_match(&entry.import_path)) {
            debug!(import_path = %entry.import_path, "excluded package");
            continue;
        }
        let rel = entry
            .dir
            .strip_prefix(&entry.root)
            .map_err(|_| CollectError::NotRelative {
                dir: entry.dir.clone(),
                root: entry.root.clone(),
            })?;
        let mut rel = rel.to_string_lossy().replace('\\', "/");
        if rel.is_empty() {
            rel.push('.');
        }
        packages.push(rel);
    }
    Ok(packages)
}
