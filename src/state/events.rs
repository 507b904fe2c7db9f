//! Table events and render snapshots

use serde::Serialize;

use crate::data::view_state::{PaginationInfo, ViewState};

/// Things that happen to a table and trigger a re-render
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// Dataset replaced
    DataLoaded { rows: usize, columns: usize },

    /// Column page changed
    PageChanged { from: usize, to: usize },

    /// Search term applied (empty term clears)
    SearchApplied { term: String, matches: usize },

    /// Rows reordered by a column
    Sorted { column_id: String },

    /// Row page size changed (list tables only)
    PageSizeChanged { size: usize },
}

/// Read-only picture of the engine handed to render observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub view: ViewState,
    pub visible_column_ids: Vec<String>,
    pub pagination: PaginationInfo,
    pub filtered_row_count: usize,
    pub rendered_row_count: usize,
}
