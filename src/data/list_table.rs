use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::datatable::{compare_cells, list_cell_text, search_text, Column, Dataset, Row};
use crate::data::records_table::EMPTY_MESSAGE;
use crate::data::view_state::PaginationInfo;
use crate::search_filter::SearchFilter;
use crate::state::dispatcher::RenderDispatcher;
use crate::state::events::TableEvent;

/// Page sizes offered by the page size selector
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];
pub const ACTIONS_HEADER: &str = "Ações";

/// Per-row action offered next to each list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowAction {
    Edit,
    Delete,
    DeleteDate,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Edit => "edit",
            RowAction::Delete => "delete",
            RowAction::DeleteDate => "delete-date",
        }
    }
}

/// Direction of a manual reorder of a list row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Copies a row value onto the rendered row under another name,
/// e.g. the record id so an action can refer back to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAttribute {
    pub name: String,
    pub column_id: String,
}

impl RowAttribute {
    pub fn new(name: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_id: column_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub page_size: usize,
    pub searchable: bool,
    pub sortable: bool,
    pub actions: Vec<RowAction>,
    pub row_attributes: Vec<RowAttribute>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            searchable: true,
            sortable: false,
            actions: Vec::new(),
            row_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    /// Index into the dataset rows; `None` for the empty-table placeholder
    pub source_index: Option<usize>,
    pub cells: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub actions: Vec<RowAction>,
}

impl ListRow {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListGrid {
    pub header: Vec<String>,
    pub rows: Vec<ListRow>,
    pub pagination: PaginationInfo,
    pub is_empty: bool,
    /// Column span of the placeholder row when the table is empty
    pub placeholder_span: usize,
}

/// Plain paginated, searchable list with optional row actions
#[derive(Debug)]
pub struct ListTable {
    dataset: Dataset,
    filtered: Vec<usize>,
    current_page: usize,
    options: ListOptions,
    dispatcher: RenderDispatcher,
    last_render: Option<ListGrid>,
}

impl ListTable {
    pub fn new(options: ListOptions) -> Self {
        let options = ListOptions {
            page_size: options.page_size.max(1),
            ..options
        };
        Self {
            dataset: Dataset::default(),
            filtered: Vec::new(),
            current_page: 1,
            options,
            dispatcher: RenderDispatcher::new(),
            last_render: None,
        }
    }

    pub fn load_data(&mut self, rows: Vec<Row>, columns: Vec<Column>) -> &ListGrid {
        info!(target: "list_table", "Loading {} rows x {} columns", rows.len(), columns.len());
        self.dataset = Dataset::new(rows, columns);
        self.filtered = (0..self.dataset.row_count()).collect();
        self.dispatcher.record(TableEvent::DataLoaded {
            rows: self.dataset.row_count(),
            columns: self.dataset.column_count(),
        });
        self.render()
    }

    /// Filter rows by a case-insensitive substring and go back to page 1
    pub fn search(&mut self, term: &str) -> &ListGrid {
        if !self.options.searchable {
            warn!(target: "list_table", "Search ignored: table is not searchable");
            return self.render();
        }
        self.filtered = SearchFilter::matching_rows(&self.dataset, term);
        self.current_page = 1;
        self.dispatcher.record(TableEvent::SearchApplied {
            term: term.to_string(),
            matches: self.filtered.len(),
        });
        self.render()
    }

    pub fn sort_by(&mut self, column_id: &str) -> &ListGrid {
        if !self.options.sortable {
            warn!(target: "list_table", "Sort ignored: table is not sortable");
            return self.render();
        }
        let rows = &self.dataset.rows;
        self.filtered
            .sort_by(|&a, &b| compare_cells(rows[a].get(column_id), rows[b].get(column_id)));
        self.dispatcher.record(TableEvent::Sorted {
            column_id: column_id.to_string(),
        });
        self.render()
    }

    pub fn change_page_size(&mut self, size: usize) -> &ListGrid {
        self.options.page_size = size.max(1);
        self.current_page = 1;
        self.dispatcher.record(TableEvent::PageSizeChanged {
            size: self.options.page_size,
        });
        self.render()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.options.page_size)
    }

    pub fn previous_page(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.current_page -= 1;
        self.page_changed(self.current_page + 1);
        true
    }

    pub fn next_page(&mut self) -> bool {
        if self.current_page >= self.total_pages() {
            return false;
        }
        self.current_page += 1;
        self.page_changed(self.current_page - 1);
        true
    }

    fn page_changed(&mut self, from: usize) {
        debug!(target: "list_table", "Moved from page {} to {}", from, self.current_page);
        self.dispatcher.record(TableEvent::PageChanged {
            from,
            to: self.current_page,
        });
        self.render();
    }

    pub fn render(&mut self) -> &ListGrid {
        let grid = self.build_grid();
        self.last_render.insert(grid)
    }

    fn build_grid(&self) -> ListGrid {
        let mut header: Vec<String> = self
            .dataset
            .columns
            .iter()
            .map(|c| c.display_label().to_string())
            .collect();
        if !self.options.actions.is_empty() {
            header.push(ACTIONS_HEADER.to_string());
        }

        let pagination = PaginationInfo::new(self.current_page, self.total_pages());
        let placeholder_span = self.dataset.column_count() + 1;

        if self.dataset.is_empty() {
            return ListGrid {
                header,
                rows: vec![ListRow {
                    source_index: None,
                    cells: vec![EMPTY_MESSAGE.to_string()],
                    attributes: Vec::new(),
                    actions: Vec::new(),
                }],
                pagination,
                is_empty: true,
                placeholder_span,
            };
        }

        let start = (self.current_page - 1).saturating_mul(self.options.page_size);
        let rows = self
            .filtered
            .iter()
            .skip(start)
            .take(self.options.page_size)
            .map(|&idx| {
                let row = &self.dataset.rows[idx];
                ListRow {
                    source_index: Some(idx),
                    cells: self
                        .dataset
                        .columns
                        .iter()
                        .map(|c| list_cell_text(row.get(&c.id)))
                        .collect(),
                    attributes: self
                        .options
                        .row_attributes
                        .iter()
                        .map(|attr| (attr.name.clone(), search_text(row.get(&attr.column_id))))
                        .collect(),
                    actions: self.options.actions.clone(),
                }
            })
            .collect();

        ListGrid {
            header,
            rows,
            pagination,
            is_empty: false,
            placeholder_span,
        }
    }

    pub fn last_render(&self) -> Option<&ListGrid> {
        self.last_render.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.options.page_size
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn event_history(&self) -> &[TableEvent] {
        self.dispatcher.get_event_history()
    }
}
