//! End-to-end pipeline tests over a fixture Go module.
//!
//! Building is disabled, so no Go toolchain is needed.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tsplit_cli::Pipeline;
use tsplit_core::SplitConfig;

const PKG1_TESTS: &str = r#"package pkg1

import "testing"

func TestAdd(t *testing.T) {}

func TestAddNegative(t *testing.T) {}

func TestMultiply(t *testing.T) {}

func TestMultiplyZero(t *testing.T) {}
"#;

const PKG2_TESTS: &str = r#"package pkg2

import "testing"

func TestMain(m *testing.M) {}

func TestConcat(t *testing.T) {}

func TestSplit(t *testing.T) {}
"#;

const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="example.com/mod/pkg1" tests="2">
    <testcase name="TestAdd" time="20.4"></testcase>
    <testcase name="TestMultiply" time="12.0"></testcase>
    <testcase name="TestMultiply/big" time="11.0"></testcase>
  </testsuite>
  <testsuite name="pkg2" tests="1">
    <testcase name="TestConcat" time="8.9"></testcase>
  </testsuite>
</testsuites>
"#;

fn fixture(root: &Path) -> SplitConfig {
    for (pkg, src) in [("pkg1", PKG1_TESTS), ("pkg2", PKG2_TESTS)] {
        let dir = root.join(pkg);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{pkg}_test.go")), src).unwrap();
        fs::write(dir.join(format!("{pkg}.go")), format!("package {pkg}\n")).unwrap();
    }
    fs::create_dir_all(root.join("reports")).unwrap();
    fs::write(root.join("reports/junit.xml"), REPORT).unwrap();

    let mut config = SplitConfig::default();
    config.nodes.count = 2;
    config.nodes.concurrency = 2;
    config.build.disabled = true;
    config.build.binaries_dir = root.join("bin");
    config.collect.report_dir = root.join("reports");
    config.emit.scripts_dir = root.join("scripts");
    config.emit.test_flags = vec!["-test.timeout=20m".into()];
    config.partition.iterations = 5_000;
    config.partition.seed = Some(17);
    config
}

#[tokio::test]
async fn split_generates_one_script_per_node() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    let pipeline = Pipeline::new(dir.path(), config);

    let summary = pipeline.run("pkg1\npkg2\nmissing\n".as_bytes()).await.unwrap();

    assert_eq!(summary.nodes.len(), 2);
    assert_eq!(summary.scripts.len(), 2);
    for script in &summary.scripts {
        assert!(script.is_file());
    }

    // pkg1: TestAdd 20 + TestMultiply 12 + two defaults; pkg2: TestConcat 8 + one default.
    assert_eq!(summary.total_seconds(), 20 + 12 + 5 + 5 + 8 + 5);

    let mut seen = HashSet::new();
    for node in &summary.nodes {
        for key in &node.keys {
            assert!(seen.insert(key.clone()), "duplicate test {key}");
        }
    }
    assert_eq!(seen.len(), 6);
    assert!(!seen.contains("pkg2:TestMain"));

    // Close means within the single longest test.
    assert!(summary.score <= 20, "spread {}", summary.score);
}

#[tokio::test]
async fn scripts_cover_every_test_with_flags() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(dir.path());
    config.emit.max_functions = 1;
    let pipeline = Pipeline::new(dir.path(), config);

    let summary = pipeline.run("pkg1\npkg2\n".as_bytes()).await.unwrap();

    let scripts: String = summary
        .scripts
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    for test in [
        "TestAdd",
        "TestAddNegative",
        "TestMultiply",
        "TestMultiplyZero",
        "TestConcat",
        "TestSplit",
    ] {
        assert!(
            scripts.contains(&format!("'^({test})$' -test.timeout=20m")),
            "missing {test}"
        );
    }
    assert!(scripts.contains("pkg1.test"));
    assert!(scripts.contains("pkg2.test"));
}

#[tokio::test]
async fn more_nodes_than_tests_yields_empty_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(dir.path());
    config.nodes.count = 10;
    let pipeline = Pipeline::new(dir.path(), config);

    let summary = pipeline.run("pkg2\n".as_bytes()).await.unwrap();

    assert_eq!(summary.scripts.len(), 10);
    assert_eq!(summary.nodes.iter().filter(|n| n.tests == 0).count(), 8);
}

#[tokio::test]
async fn missing_history_falls_back_to_default_durations() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(dir.path());
    config.collect.report_dir = dir.path().join("no-reports");
    config.collect.default_duration_secs = 3;
    let pipeline = Pipeline::new(dir.path(), config);

    let summary = pipeline.run("pkg1\n".as_bytes()).await.unwrap();

    assert_eq!(summary.total_seconds(), 4 * 3);
    assert_eq!(summary.score, 0);
}

#[tokio::test]
async fn custom_template_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(dir.path());
    let template = dir.path().join("node.tmpl");
    fs::write(
        &template,
        "node {{ node_index }} of {{ concurrency }}: {{ total_seconds }}s\n",
    )
    .unwrap();
    config.emit.template = Some(template);
    let pipeline = Pipeline::new(dir.path(), config);

    let summary = pipeline.run("pkg2\n".as_bytes()).await.unwrap();

    let first = fs::read_to_string(&summary.scripts[0]).unwrap();
    assert!(first.starts_with("node 0 of 2: "));
}
