//! Output formatting for replay results
//!
//! Provides colored CLI output for signals and the final summary.

pub mod cli;

pub use cli::{CliOutput, OutputLevel};
