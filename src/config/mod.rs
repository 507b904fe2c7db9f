//! Configuration module
//!
//! Settings file handling: server address, table layout and display.

pub mod config;
