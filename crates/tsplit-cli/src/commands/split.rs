//! `tsplit split`: The full pipeline.

use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use tsplit_cli::{Pipeline, format_summary};
use tsplit_core::SplitConfig;

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Number of nodes
    #[arg(short, long)]
    pub nodes: Option<usize>,
    /// Number of concurrent test executions per node
    #[arg(short, long)]
    pub concurrency: Option<usize>,
    /// Directory to output generated scripts
    #[arg(short = 'o', long)]
    pub scripts_dir: Option<PathBuf>,
    /// Scan Go packages under the current directory instead of reading stdin
    #[arg(short, long)]
    pub scan_packages: bool,
    /// Regex of import paths to exclude (with --scan-packages)
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,
    /// Directory containing JUnit XML and go test -json reports
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,
    /// Path to a custom script template
    #[arg(short, long)]
    pub template: Option<PathBuf>,
    /// Maximum test functions per test binary invocation (0: unlimited)
    #[arg(short, long)]
    pub max_functions: Option<usize>,
    /// Directory to write or read test binaries
    #[arg(short = 'p', long)]
    pub binaries_dir: Option<PathBuf>,
    /// Concurrency for building test binaries
    #[arg(short, long)]
    pub build_concurrency: Option<usize>,
    /// Skip building test binaries (they are provided some other way)
    #[arg(short, long)]
    pub disable_build: bool,
    /// Annealing iterations
    #[arg(long)]
    pub iterations: Option<usize>,
    /// Seed for a reproducible split
    #[arg(long)]
    pub seed: Option<u64>,
    /// Config file (default: ./tsplit.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
    /// Flags passed to every test binary, after `--`
    #[arg(last = true)]
    pub test_flags: Vec<String>,
}

impl SplitArgs {
    /// Overlay command-line values on top of the file config.
    pub fn apply(&self, config: &mut SplitConfig) {
        if let Some(n) = self.nodes {
            config.nodes.count = n;
        }
        if let Some(c) = self.concurrency {
            config.nodes.concurrency = c;
        }
        if let Some(dir) = &self.scripts_dir {
            config.emit.scripts_dir = dir.clone();
        }
        if self.scan_packages {
            config.collect.scan_packages = true;
        }
        if let Some(x) = &self.exclude {
            config.collect.exclude = Some(x.clone());
        }
        if let Some(dir) = &self.report_dir {
            config.collect.report_dir = dir.clone();
        }
        if let Some(t) = &self.template {
            config.emit.template = Some(t.clone());
        }
        if let Some(m) = self.max_functions {
            config.emit.max_functions = m;
        }
        if let Some(dir) = &self.binaries_dir {
            config.build.binaries_dir = dir.clone();
        }
        if let Some(b) = self.build_concurrency {
            config.build.concurrency = b;
        }
        if self.disable_build {
            config.build.disabled = true;
        }
        if let Some(i) = self.iterations {
            config.partition.iterations = i;
        }
        if self.seed.is_some() {
            config.partition.seed = self.seed;
        }
        if !self.test_flags.is_empty() {
            config.emit.test_flags = self.test_flags.clone();
        }
    }
}

pub async fn split(args: SplitArgs) -> anyhow::Result<()> {
    if !matches!(args.format.as_str(), "text" | "json") {
        bail!("unsupported output format: {} (expected text or json)", args.format);
    }

    let root = std::env::current_dir().context("could not get current directory")?;
    let mut config = SplitConfig::load_or_default(args.config.as_deref(), &root)?;
    args.apply(&mut config);
    config.validate()?;

    let pipeline = Pipeline::new(root, config);
    let summary = pipeline.run(BufReader::new(std::io::stdin())).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print!("{}", format_summary(&summary)),
    }
    Ok(())
}
