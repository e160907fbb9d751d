//! Historical test durations.
//!
//! Two report formats are understood, both found by walking the report
//! directory:
//!
//! - `*.xml`: JUnit `<testsuites>` documents, one `<testcase time="…">` per test
//! - `*.json`: `go test -json` event streams, timed from `run` to `pass`/`fail`/`skip`
//!
//! Subtests (names containing `/`) are ignored: they run inside their parent.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{CollectError, CollectResult};

/// One timed test from a report.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    /// Suite (JUnit) or package (`go test -json`) name.
    pub suite: String,
    pub test: String,
    pub duration: Duration,
}

/// Durations indexed for lookup by package and function.
#[derive(Debug, Clone, Default)]
pub struct DurationHistory {
    by_key: HashMap<String, Duration>,
    by_test: HashMap<String, Vec<(String, Duration)>>,
}

impl DurationHistory {
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Record a duration. A later record for the same suite and test wins.
    pub fn insert(&mut self, record: TestRecord) {
        self.by_key
            .insert(format!("{}.{}", record.suite, record.test), record.duration);
        let suites = self.by_test.entry(record.test).or_default();
        match suites.iter().position(|(s, _)| *s == record.suite) {
            Some(i) => suites[i].1 = record.duration,
            None => suites.push((record.suite, record.duration)),
        }
    }

    /// Duration recorded for `function` in `package`.
    ///
    /// Tries the exact `"<package>.<function>"` key first, then any suite
    /// whose import path ends with `/<package>`, since reports name suites
    /// by import path while packages are listed as relative directories.
    pub fn lookup(&self, package: &str, function: &str) -> Option<Duration> {
        if let Some(d) = self.by_key.get(&format!("{package}.{function}")) {
            return Some(*d);
        }
        if package.is_empty() || package == "." {
            return None;
        }
        let suffix = format!("/{}", package.trim_start_matches("./"));
        self.by_test
            .get(function)?
            .iter()
            .find(|(suite, _)| suite.ends_with(&suffix))
            .map(|(_, d)| *d)
    }
}

#[derive(Debug, Deserialize)]
struct JunitSuites {
    #[serde(rename = "testsuite", default)]
    suites: Vec<JunitSuite>,
}

#[derive(Debug, Deserialize)]
struct JunitSuite {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "testcase", default)]
    cases: Vec<JunitCase>,
}

#[derive(Debug, Deserialize)]
struct JunitCase {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@time", default)]
    time: f64,
}

/// Parse a JUnit XML `<testsuites>` document.
pub fn parse_junit(content: &str) -> CollectResult<Vec<TestRecord>> {
    let doc: JunitSuites = quick_xml::de::from_str(content)?;
    let records = doc
        .suites
        .into_iter()
        .flat_map(|suite| {
            let name = suite.name;
            suite
                .cases
                .into_iter()
                .filter(|c| !c.name.contains('/'))
                .map(move |c| TestRecord {
                    suite: name.clone(),
                    test: c.name,
                    duration: Duration::try_from_secs_f64(c.time).unwrap_or_default(),
                })
        })
        .collect();
    Ok(records)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestEvent {
    time: Option<DateTime<FixedOffset>>,
    action: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    test: Option<String>,
}

#[derive(Default)]
struct Span {
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
}

/// Parse a `go test -json` event stream.
///
/// Malformed lines are logged and skipped. Tests without both a start and
/// an end event are dropped.
pub fn parse_go_test_json<R: BufRead>(reader: R) -> Vec<TestRecord> {
    let mut spans: BTreeMap<(String, String), Span> = BTreeMap::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) if l.trim().is_empty() => continue,
            Ok(l) => l,
            Err(e) => {
                warn!("failed to read test event stream: {e}");
                break;
            }
        };
        let event: TestEvent = match serde_json::from_str(&line) {
            Ok(ev) => ev,
            Err(e) => {
                debug!("skipping malformed test event: {e}");
                continue;
            }
        };
        let Some(test) = event.test.filter(|t| !t.contains('/')) else {
            continue;
        };

        let span = spans.entry((event.package, test)).or_default();
        match event.action.as_str() {
            "run" => span.start = event.time,
            "pass" | "fail" | "skip" => span.end = event.time,
            _ => {}
        }
    }

    spans
        .into_iter()
        .filter_map(|((suite, test), span)| {
            let duration = (span.end? - span.start?).to_std().ok()?;
            Some(TestRecord { suite, test, duration })
        })
        .collect()
}

/// Load every report under `dir` into a [`DurationHistory`].
///
/// A missing directory yields an empty history. Files that cannot be read
/// or parsed are logged and skipped.
pub fn load_durations(dir: &Path) -> CollectResult<DurationHistory> {
    let mut history = DurationHistory::default();
    if !dir.exists() {
        warn!(dir = %dir.display(), "report directory does not exist, no duration history");
        return Ok(history);
    }

    let mut files = 0usize;
    let mut cases = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(CollectError::Io {
                    path: dir.to_path_buf(),
                    source: std::io::Error::other(e.to_string()),
                });
            }
            Err(e) => {
                debug!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let records = match path.extension().and_then(|e| e.to_str()) {
            Some("xml") => match std::fs::read_to_string(path) {
                Ok(content) => match parse_junit(&content) {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(file = %path.display(), "failed to parse JUnit report: {e}");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(file = %path.display(), "failed to read report: {e}");
                    continue;
                }
            },
            Some("json") => match File::open(path) {
                Ok(f) => parse_go_test_json(BufReader::new(f)),
                Err(e) => {
                    warn!(file = %path.display(), "failed to read report: {e}");
                    continue;
                }
            },
            _ => continue,
        };

        files += 1;
        cases += records.len();
        for record in records {
            history.insert(record);
        }
    }

    info!(cases, files, dir = %dir.display(), "loaded test durations");
    Ok(history)
}
