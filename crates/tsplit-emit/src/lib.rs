//! tsplit-emit: Turn partitioned chunks into per-node test scripts.
//!
//! - **`node`**: regroups chunk keys by package and builds `-test.run` lines
//! - **`script`**: renders the script template once per node

pub mod error;
pub mod node;
pub mod script;

pub use error::{EmitError, EmitResult};
pub use node::{NodeTests, TestLine};
pub use script::{
    DEFAULT_TEMPLATE, ScriptOptions, TemplateData, load_template, render_script, write_scripts,
};
