//! Output formatters for duplicate scan results.
//!
//! - Text for people
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::DuplicateFinder;
//! use dupesweep::error::ExitCode;
//! use dupesweep::output::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let exit_code = ExitCode::for_scan(&groups, &summary);
//! let output = JsonOutput::new(&groups, &summary, exit_code);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
