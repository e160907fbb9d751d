//! tsplit-build: Compile Go test binaries ahead of the test run.
//!
//! Each package is compiled with `go test -c` into a shared output
//! directory. Builds run concurrently up to a fixed limit; a failing
//! package never cancels the others, and every outcome is collected
//! before the build is reported.
//!
//! The compiler is behind the [`Compiler`] trait so the pool can be
//! exercised without a Go toolchain.

pub mod error;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use tsplit_core::binary_name;

pub use error::{BuildError, BuildResult};

/// Compiles one package's tests into a standalone binary.
pub trait Compiler: Send + Sync + 'static {
    /// Build the tests in `package_dir` into `output`. Returns the tool's
    /// combined output on success.
    fn compile(&self, package: &str, package_dir: &Path, output: &Path) -> BuildResult<String>;
}

/// Runs `go test -c -o <output> .` inside the package directory.
#[derive(Debug, Clone, Default)]
pub struct GoCompiler;

impl Compiler for GoCompiler {
    fn compile(&self, package: &str, package_dir: &Path, output: &Path) -> BuildResult<String> {
        let mut cmd = Command::new("go");
        cmd.arg("test")
            .arg("-c")
            .arg("-o")
            .arg(output)
            .arg(".")
            .current_dir(package_dir);
        debug!("Running: {:?}", cmd);

        let out = cmd.output().map_err(|source| BuildError::Io {
            path: package_dir.to_path_buf(),
            source,
        })?;
        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));

        if !out.status.success() {
            return Err(BuildError::Compile {
                package: package.to_string(),
                code: out.status.code().unwrap_or(-1),
                output: combined,
            });
        }
        Ok(combined)
    }
}

/// Result of building one package.
#[derive(Debug)]
pub struct BuildOutcome {
    pub package: String,
    pub binary: PathBuf,
    pub result: BuildResult<String>,
}

/// Every package's outcome, sorted by package.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<BuildOutcome>,
}

impl BuildReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> Vec<&BuildOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err()).collect()
    }

    /// Binary paths if every build succeeded, else [`BuildError::Failed`].
    pub fn into_result(self) -> BuildResult<Vec<PathBuf>> {
        let total = self.outcomes.len();
        let failed: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.package.clone())
            .collect();
        if !failed.is_empty() {
            return Err(BuildError::Failed {
                failed: failed.len(),
                total,
                packages: failed,
            });
        }
        Ok(self.outcomes.into_iter().map(|o| o.binary).collect())
    }
}

/// Build test binaries for `packages` (relative to `root`) into `out_dir`,
/// running at most `concurrency` compilations at once.
pub async fn build_test_binaries<C: Compiler>(
    compiler: Arc<C>,
    packages: &[String],
    root: &Path,
    out_dir: &Path,
    concurrency: usize,
) -> BuildResult<BuildReport> {
    if concurrency == 0 {
        return Err(BuildError::InvalidConcurrency);
    }

    let out_dir = std::path::absolute(out_dir).map_err(|source| BuildError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    std::fs::create_dir_all(&out_dir).map_err(|source| BuildError::Io {
        path: out_dir.clone(),
        source,
    })?;

    info!(packages = packages.len(), concurrency, "building test binaries");

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();
    let mut pending: Vec<(String, PathBuf)> = Vec::with_capacity(packages.len());

    for package in packages {
        let package = package.clone();
        let package_dir = root.join(&package);
        let binary = out_dir.join(binary_name(&package));
        let compiler = compiler.clone();
        pending.push((package.clone(), binary.clone()));

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BuildError::Join(e.to_string()))?;

        tasks.spawn_blocking(move || {
            let _permit = permit;
            debug!(package = %package, binary = %binary.display(), "building");

            let result = compiler.compile(&package, &package_dir, &binary);
            match &result {
                Ok(output) if !output.trim().is_empty() => {
                    info!(package = %package, "{}", output.trim());
                }
                Ok(_) => {}
                Err(e) => error!(package = %package, "{e}"),
            }

            BuildOutcome {
                package,
                binary,
                result,
            }
        });
    }

    let mut report = BuildReport::default();
    let mut join_errors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                if let Some(i) = pending.iter().position(|(p, _)| *p == outcome.package) {
                    pending.swap_remove(i);
                }
                report.outcomes.push(outcome);
            }
            Err(e) => {
                error!("build task failed: {e}");
                join_errors.push(e.to_string());
            }
        }
    }

    // A task that panicked or was cancelled leaves its package without an
    // outcome; record those as failures.
    let reason = join_errors.join("; ");
    for (package, binary) in pending {
        report.outcomes.push(BuildOutcome {
            package,
            binary,
            result: Err(BuildError::Join(reason.clone())),
        });
    }
    report.outcomes.sort_by(|a, b| a.package.cmp(&b.package));

    info!(
        succeeded = report.succeeded(),
        failed = report.outcomes.len() - report.succeeded(),
        "test binary build finished"
    );
    Ok(report)
}
