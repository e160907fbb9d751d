//! tsplit-collect: Builds the `{test → duration}` input for the partitioner.
//!
//! - **`packages`**: package list from stdin or `go list -test ./...`
//! - **`functions`**: `Test*` functions found in each package's `_test.go` files
//! - **`history`**: past durations from JUnit XML and `go test -json` reports
//! - **`weights`**: joins functions with history, defaulting unknown tests

pub mod error;
pub mod functions;
pub mod history;
pub mod packages;
pub mod weights;

pub use error::{CollectError, CollectResult};
pub use functions::scan_test_functions;
pub use history::{DurationHistory, load_durations};
pub use packages::{read_packages, scan_packages};
pub use weights::collect_tests;
