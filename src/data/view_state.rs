use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::datatable::Column;

/// Paging and search state of a records table.
///
/// The first `fixed_column_count` columns are always shown; the rest are
/// paged `columns_per_page` at a time. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub current_page: usize,
    pub columns_per_page: usize,
    pub fixed_column_count: usize,
    pub search_term: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_page: 1,
            columns_per_page: 7,
            fixed_column_count: 1,
            search_term: String::new(),
        }
    }
}

impl ViewState {
    pub fn new(fixed_column_count: usize, columns_per_page: usize) -> Self {
        Self {
            fixed_column_count,
            columns_per_page: columns_per_page.max(1),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.current_page = page.max(1);
        self
    }

    /// Columns visible on the current page: the pinned columns followed by
    /// this page's slice of the paged ones. A page past the end just yields
    /// the pinned columns.
    pub fn visible_columns<'a>(&self, columns: &'a [Column]) -> Vec<&'a Column> {
        let fixed_end = self.fixed_column_count.min(columns.len());
        let per_page = self.columns_per_page.max(1);
        let start = self
            .fixed_column_count
            .saturating_add(self.current_page.saturating_sub(1).saturating_mul(per_page));
        let end = start.saturating_add(per_page).min(columns.len());

        let mut visible: Vec<&Column> = columns[..fixed_end].iter().collect();
        if start < end {
            visible.extend(columns[start..end].iter());
        }
        visible
    }

    /// Number of column pages for a table with `column_count` columns
    pub fn total_pages(&self, column_count: usize) -> usize {
        let paged = column_count.saturating_sub(self.fixed_column_count);
        paged.div_ceil(self.columns_per_page.max(1))
    }

    pub fn pagination(&self, column_count: usize) -> PaginationInfo {
        PaginationInfo::new(self.current_page, self.total_pages(column_count))
    }

    /// Step back one page. Refused (returns false) on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            debug!(target: "pagination", "Moved to page {}", self.current_page);
            true
        } else {
            false
        }
    }

    /// Step forward one page. Refused (returns false) on the last page.
    pub fn next_page(&mut self, column_count: usize) -> bool {
        if self.current_page < self.total_pages(column_count) {
            self.current_page += 1;
            debug!(target: "pagination", "Moved to page {}", self.current_page);
            true
        } else {
            false
        }
    }
}

/// What a pager needs to draw its controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationInfo {
    pub fn new(current_page: usize, total_pages: usize) -> Self {
        Self {
            current_page,
            total_pages,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
        }
    }

    /// "Página 2 de 5"
    pub fn label(&self) -> String {
        format!("Página {} de {}", self.current_page, self.total_pages)
    }
}
