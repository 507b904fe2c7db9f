//! Utility functions and helpers
//!
//! Application paths and the logging setup shared by the CLI and the REPL.

pub mod app_paths;
pub mod log_file;
pub mod logging;
