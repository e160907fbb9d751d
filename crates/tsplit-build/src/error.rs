//! Build error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to compile {package} (exit code {code}):\n{output}")]
    Compile {
        package: String,
        code: i32,
        output: String,
    },

    #[error("build task failed: {0}")]
    Join(String),

    #[error("{failed} of {total} test binaries failed to build: {}", packages.join(", "))]
    Failed {
        failed: usize,
        total: usize,
        packages: Vec<String>,
    },
}

pub type BuildResult<T> = Result<T, BuildError>;
