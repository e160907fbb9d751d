pub mod config;
pub mod types;

pub use config::{ConfigError, SplitConfig};
pub use types::*;
