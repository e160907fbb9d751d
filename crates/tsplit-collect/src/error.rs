//! Collector error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to run go list: {0}")]
    GoList(String),

    #[error("failed to parse go list output: {0}")]
    MalformedGoList(#[from] serde_json::Error),

    #[error("package dir {dir} is not under module root {root}")]
    NotRelative { dir: PathBuf, root: PathBuf },

    #[error("failed to parse JUnit report: {0}")]
    Junit(#[from] quick_xml::DeError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type CollectResult<T> = Result<T, CollectError>;
