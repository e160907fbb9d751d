//! tsplit: Split Go tests across CI nodes by recorded duration.
//!
//! The binary wires the workspace crates into one pipeline:
//!
//! ```text
//! packages (stdin | go list) ─► go test -c ─► scan Test* ─► load history
//!     ─► split_balanced ─► test-node-<i>.sh
//! ```

pub mod pipeline;
pub mod summary;

pub use pipeline::Pipeline;
pub use summary::{NodeSummary, Summary, format_summary};
