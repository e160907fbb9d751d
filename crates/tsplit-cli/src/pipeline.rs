//! The end-to-end split pipeline.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tsplit_build::{GoCompiler, build_test_binaries};
use tsplit_collect::{
    DurationHistory, collect_tests, load_durations, read_packages, scan_packages,
    scan_test_functions,
};
use tsplit_core::{SplitConfig, TestInfo, weight_map};
use tsplit_emit::{NodeTests, ScriptOptions, load_template, write_scripts};
use tsplit_partition::{Chunk, split_balanced};

use crate::summary::Summary;

/// One configured run of the splitter over a Go module.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Module root; package paths are relative to it.
    pub root: PathBuf,
    pub config: SplitConfig,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, config: SplitConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Package list from `go list` when scanning is enabled, else from `input`.
    pub fn packages<R: BufRead>(&self, input: R) -> Result<Vec<String>> {
        if self.config.collect.scan_packages {
            scan_packages(&self.root, self.config.collect.exclude.as_deref())
                .with_context(|| format!("failed to scan packages in {}", self.root.display()))
        } else {
            let packages = read_packages(input).context("failed to read packages from stdin")?;
            info!(?packages, "read packages from stdin");
            Ok(packages)
        }
    }

    /// Compile test binaries unless building is disabled.
    pub async fn build(&self, packages: &[String]) -> Result<()> {
        if self.config.build.disabled {
            info!("test binary build disabled");
            return Ok(());
        }
        let report = build_test_binaries(
            Arc::new(GoCompiler),
            packages,
            &self.root,
            &self.config.build.binaries_dir,
            self.config.build.concurrency,
        )
        .await?;
        report.into_result().context("failed to build test binaries")?;
        Ok(())
    }

    /// Discover test functions and attach durations.
    ///
    /// A failure to load history is only a warning: every test then gets
    /// the default duration.
    pub fn collect(&self, packages: &[String]) -> Result<Vec<TestInfo>> {
        let functions = scan_test_functions(&self.root, packages);

        let history = load_durations(&self.config.collect.report_dir).unwrap_or_else(|e| {
            warn!("failed to load test durations: {e}");
            DurationHistory::default()
        });

        let default = Duration::from_secs(self.config.collect.default_duration_secs);
        Ok(collect_tests(&functions, &history, default))
    }

    /// Balance tests across the configured number of nodes.
    pub fn partition(&self, tests: &[TestInfo]) -> Result<Vec<Chunk>> {
        let weights = weight_map(tests);
        split_balanced(&weights, self.config.nodes.count, &self.config.partition)
            .context("failed to split tests")
    }

    /// Write one script per chunk.
    pub fn emit(&self, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        let template = load_template(self.config.emit.template.as_deref())
            .context("failed to load template")?;
        let opts = ScriptOptions {
            scripts_dir: self.config.emit.scripts_dir.clone(),
            concurrency: self.config.nodes.concurrency,
            max_functions: self.config.emit.max_functions,
            test_flags: self.config.emit.test_flags.clone(),
            report_dir: self.config.collect.report_dir.clone(),
            binaries_dir: self.config.build.binaries_dir.clone(),
        };
        write_scripts(&NodeTests::from_chunks(chunks), &template, &opts)
            .context("failed to generate script files")
    }

    /// Run every stage in order.
    pub async fn run<R: BufRead>(&self, input: R) -> Result<Summary> {
        let packages = self.packages(input)?;
        self.build(&packages).await?;
        let tests = self.collect(&packages)?;
        let chunks = self.partition(&tests)?;
        let scripts = self.emit(&chunks)?;
        Ok(Summary::new(&chunks, scripts, &self.config.emit.scripts_dir))
    }
}
