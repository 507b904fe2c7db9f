//! Data layer for the Dataset/ViewState architecture
//!
//! Storage (`datatable`), windowing (`view_state`), aggregates
//! (`record_stats`) and the two table engines built on top of them.

// Core data modules
pub mod datatable;
pub mod record_stats;
pub mod view_state;

// Table engines
pub mod list_table;
pub mod records_table;

// Shaping and export
pub mod data_exporter;
pub mod records_builder;
