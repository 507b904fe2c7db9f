use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::datatable::{
    compare_cells, format_fixed, pivot_cell_text, Column, Dataset, Row,
};
use crate::data::record_stats::{
    has_numeric_value, row_average, row_sum, summary_average, RowAverage,
};
use crate::data::view_state::{PaginationInfo, ViewState};
use crate::search_filter::SearchFilter;
use crate::state::dispatcher::{RenderDispatcher, RenderObserver};
use crate::state::events::{EngineSnapshot, TableEvent};

/// Shown in place of the body when the dataset has no rows
pub const EMPTY_MESSAGE: &str = "Nenhum registro encontrado";
pub const SUM_HEADER: &str = "Total";
pub const AVERAGE_HEADER: &str = "Média";

/// Behaviour switches of a records table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub searchable: bool,
    pub sortable: bool,
    pub show_row_sum: bool,
    pub show_row_average: bool,
    /// Trailing summary rows left out of the row extrema
    pub rows_to_ignore: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            searchable: true,
            sortable: false,
            show_row_sum: true,
            show_row_average: false,
            rows_to_ignore: 1,
        }
    }
}

/// Classification of a whole body row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowTag {
    HighestSum,
    LowestSum,
}

impl RowTag {
    pub fn css_class(&self) -> &'static str {
        match self {
            RowTag::HighestSum => "highest-sum",
            RowTag::LowestSum => "lowest-sum",
        }
    }
}

/// Classification of a single cell of the summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellTag {
    HighestTotalValue,
    LowestTotalValue,
}

impl CellTag {
    pub fn css_class(&self) -> &'static str {
        match self {
            CellTag::HighestTotalValue => "highest-total-value",
            CellTag::LowestTotalValue => "lowest-total-value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellKind {
    Value,
    Sum,
    Average,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub label: String,
    pub kind: CellKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub text: String,
    pub kind: CellKind,
    pub tags: Vec<CellTag>,
    pub col_span: usize,
}

impl GridCell {
    fn new(text: String, kind: CellKind) -> Self {
        Self {
            text,
            kind,
            tags: Vec::new(),
            col_span: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    /// Index into the dataset rows; `None` for the empty-table placeholder
    pub source_index: Option<usize>,
    pub cells: Vec<GridCell>,
    pub tags: Vec<RowTag>,
}

impl GridRow {
    pub fn has_tag(&self, tag: RowTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Render-ready output of one pass: what to show and how to classify it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedGrid {
    pub header: Vec<HeaderCell>,
    pub rows: Vec<GridRow>,
    pub pagination: PaginationInfo,
    pub is_empty: bool,
}

impl RenderedGrid {
    pub fn header_labels(&self) -> Vec<&str> {
        self.header.iter().map(|h| h.label.as_str()).collect()
    }

    /// Rendered row for a given dataset row, if it was not suppressed
    pub fn row_for_source(&self, source_index: usize) -> Option<&GridRow> {
        self.rows
            .iter()
            .find(|r| r.source_index == Some(source_index))
    }
}

/// Extremes of the summary row: (visible column index, value)
struct TotalExtrema {
    highest: usize,
    lowest: usize,
}

fn summary_extrema(last_row: &Row, visible: &[&Column]) -> Option<TotalExtrema> {
    let values: Vec<(usize, f64)> = visible
        .iter()
        .enumerate()
        .skip(1)
        .map(|(idx, c)| (idx, last_row.number(&c.id).unwrap_or(0.0)))
        .collect();

    let first = *values.first()?;
    let (highest, _) = values
        .iter()
        .fold(first, |max, cur| if cur.1 > max.1 { *cur } else { max });
    let (lowest, _) = values
        .iter()
        .fold(first, |min, cur| if cur.1 < min.1 { *cur } else { min });

    Some(TotalExtrema { highest, lowest })
}

/// One full render pass over a dataset.
///
/// `filtered` holds indices into `dataset.rows` in display order. The pass
/// is pure: the same inputs always give the same grid.
pub fn render_grid(
    dataset: &Dataset,
    filtered: &[usize],
    view: &ViewState,
    options: &TableOptions,
) -> RenderedGrid {
    let visible = view.visible_columns(&dataset.columns);
    let pagination = view.pagination(dataset.column_count());

    let mut header: Vec<HeaderCell> = visible
        .iter()
        .map(|c| HeaderCell {
            label: c.display_label().to_string(),
            kind: CellKind::Value,
        })
        .collect();
    if options.show_row_sum {
        header.push(HeaderCell {
            label: SUM_HEADER.to_string(),
            kind: CellKind::Sum,
        });
    }
    if options.show_row_average {
        header.push(HeaderCell {
            label: AVERAGE_HEADER.to_string(),
            kind: CellKind::Average,
        });
    }

    if dataset.is_empty() {
        let mut placeholder = GridCell::new(EMPTY_MESSAGE.to_string(), CellKind::Placeholder);
        placeholder.col_span = header.len().max(1);
        return RenderedGrid {
            header,
            rows: vec![GridRow {
                source_index: None,
                cells: vec![placeholder],
                tags: Vec::new(),
            }],
            pagination,
            is_empty: true,
        };
    }

    let rows: Vec<(usize, &Row)> = filtered
        .iter()
        .filter_map(|&idx| dataset.rows.get(idx).map(|row| (idx, row)))
        .collect();
    let row_count = rows.len();
    let trailing_start = row_count.saturating_sub(options.rows_to_ignore);
    let data_rows = &rows[..trailing_start];

    let max_sum = data_rows
        .iter()
        .map(|(_, row)| row_sum(row, &visible))
        .fold(f64::NEG_INFINITY, f64::max);
    let min_avg = data_rows
        .iter()
        .filter(|(_, row)| has_numeric_value(row, &visible))
        .map(|(_, row)| row_average(row, &visible))
        .fold(None, |min: Option<f64>, avg| match min {
            Some(m) if m <= avg => Some(m),
            _ => Some(avg),
        });

    let extrema = rows
        .last()
        .and_then(|(_, last)| summary_extrema(last, &visible));

    debug!(
        target: "records_table",
        "Render pass: {} filtered rows, {} visible columns, max_sum={}, min_avg={:?}",
        row_count,
        visible.len(),
        max_sum,
        min_avg
    );

    let mut grid_rows = Vec::with_capacity(row_count);

    for (position, (source_index, row)) in rows.iter().enumerate() {
        if !has_numeric_value(row, &visible) {
            continue;
        }

        let is_summary_row = position == row_count - 1;
        let is_data_row = position < trailing_start;

        let mut cells: Vec<GridCell> = visible
            .iter()
            .enumerate()
            .map(|(col_idx, column)| {
                let mut cell = GridCell::new(pivot_cell_text(row.get(&column.id)), CellKind::Value);
                if is_summary_row {
                    if let Some(ext) = &extrema {
                        if col_idx == ext.highest {
                            cell.tags.push(CellTag::HighestTotalValue);
                        }
                        if col_idx == ext.lowest {
                            cell.tags.push(CellTag::LowestTotalValue);
                        }
                    }
                }
                cell
            })
            .collect();

        let mut tags = Vec::new();

        if options.show_row_sum {
            let sum = row_sum(row, &visible);
            cells.push(GridCell::new(format_fixed(sum, 2), CellKind::Sum));

            if is_data_row {
                if sum == max_sum {
                    tags.push(RowTag::HighestSum);
                }
                if min_avg == Some(row_average(row, &visible)) {
                    tags.push(RowTag::LowestSum);
                }
            }
        }

        if options.show_row_average {
            let average = if is_summary_row {
                let others: Vec<&Row> = rows[..position].iter().map(|(_, r)| *r).collect();
                summary_average(row, &visible, &others)
            } else {
                RowAverage::Plain(row_average(row, &visible))
            };
            cells.push(GridCell::new(average.to_string(), CellKind::Average));
        }

        grid_rows.push(GridRow {
            source_index: Some(*source_index),
            cells,
            tags,
        });
    }

    RenderedGrid {
        header,
        rows: grid_rows,
        pagination,
        is_empty: false,
    }
}

/// Pivoted records table: pinned label column, date columns paged
/// horizontally, per-row aggregates and extrema highlighting.
///
/// Holds the dataset and the view; every mutation re-renders the grid
/// from scratch and notifies the render observers.
#[derive(Debug)]
pub struct RecordsTable {
    dataset: Dataset,
    filtered: Vec<usize>,
    view: ViewState,
    options: TableOptions,
    dispatcher: RenderDispatcher,
    last_render: Option<RenderedGrid>,
}

impl RecordsTable {
    pub fn new(view: ViewState, options: TableOptions) -> Self {
        Self {
            dataset: Dataset::default(),
            filtered: Vec::new(),
            view,
            options,
            dispatcher: RenderDispatcher::new(),
            last_render: None,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn RenderObserver>) {
        self.dispatcher.subscribe(observer);
    }

    /// Replace the dataset, reset the filtered view to all rows and render
    /// starting at `initial_page`
    pub fn load_data(
        &mut self,
        rows: Vec<Row>,
        columns: Vec<Column>,
        initial_page: usize,
    ) -> &RenderedGrid {
        info!(
            target: "records_table",
            "Loading {} rows x {} columns at page {}",
            rows.len(),
            columns.len(),
            initial_page
        );
        self.dataset = Dataset::new(rows, columns);
        self.filtered = (0..self.dataset.row_count()).collect();
        self.view.search_term.clear();
        self.view.current_page = initial_page.max(1);
        self.dispatcher.record(TableEvent::DataLoaded {
            rows: self.dataset.row_count(),
            columns: self.dataset.column_count(),
        });
        self.render()
    }

    /// Filter rows by a case-insensitive substring. The current page is kept.
    pub fn search(&mut self, term: &str) -> &RenderedGrid {
        if !self.options.searchable {
            warn!(target: "records_table", "Search ignored: table is not searchable");
            return self.render();
        }
        self.view.search_term = term.to_string();
        self.filtered = SearchFilter::matching_rows(&self.dataset, term);
        self.dispatcher.record(TableEvent::SearchApplied {
            term: term.to_string(),
            matches: self.filtered.len(),
        });
        self.render()
    }

    /// Stable sort of the filtered rows by one column
    pub fn sort_by(&mut self, column_id: &str) -> &RenderedGrid {
        if !self.options.sortable {
            warn!(target: "records_table", "Sort ignored: table is not sortable");
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

    /// Go back one column page. Returns false (and does not render) on the first page.
    pub fn previous_page(&mut self) -> bool {
        let from = self.view.current_page;
        if !self.view.previous_page() {
            return false;
        }
        self.page_changed(from);
        true
    }

    /// Go forward one column page. Returns false (and does not render) on the last page.
    pub fn next_page(&mut self) -> bool {
        let from = self.view.current_page;
        if !self.view.next_page(self.dataset.column_count()) {
            return false;
        }
        self.page_changed(from);
        true
    }

    /// Jump to a page chosen by the caller. Out-of-range pages are allowed
    /// and render only the pinned columns.
    pub fn set_page(&mut self, page: usize) -> &RenderedGrid {
        let from = self.view.current_page;
        self.view.current_page = page.max(1);
        self.dispatcher.record(TableEvent::PageChanged {
            from,
            to: self.view.current_page,
        });
        self.render()
    }

    /// Page on which the paged column at `column_index` is shown
    pub fn page_of_column(&self, column_index: usize) -> Option<usize> {
        if column_index < self.view.fixed_column_count
            || column_index >= self.dataset.column_count()
        {
            return None;
        }
        Some((column_index - self.view.fixed_column_count) / self.view.columns_per_page.max(1) + 1)
    }

    fn page_changed(&mut self, from: usize) {
        self.dispatcher.record(TableEvent::PageChanged {
            from,
            to: self.view.current_page,
        });
        self.render();
    }

    /// Full render pass; observers run after every non-empty render
    pub fn render(&mut self) -> &RenderedGrid {
        let grid = render_grid(&self.dataset, &self.filtered, &self.view, &self.options);

        if !grid.is_empty {
            let snapshot = self.snapshot_for(&grid);
            self.dispatcher.notify_rendered(&self.dataset, &snapshot);
        }

        self.last_render.insert(grid)
    }

    fn snapshot_for(&self, grid: &RenderedGrid) -> EngineSnapshot {
        EngineSnapshot {
            view: self.view.clone(),
            visible_column_ids: self
                .visible_columns()
                .iter()
                .map(|c| c.id.clone())
                .collect(),
            pagination: grid.pagination,
            filtered_row_count: self.filtered.len(),
            rendered_row_count: grid.rows.len(),
        }
    }

    pub fn last_render(&self) -> Option<&RenderedGrid> {
        self.last_render.as_ref()
    }

    pub fn visible_columns(&self) -> Vec<&Column> {
        self.view.visible_columns(&self.dataset.columns)
    }

    pub fn pagination(&self) -> PaginationInfo {
        self.view.pagination(self.dataset.column_count())
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Rows currently passing the search, in display order
    pub fn filtered_rows(&self) -> impl Iterator<Item = &Row> {
        self.filtered.iter().map(move |&i| &self.dataset.rows[i])
    }

    pub fn event_history(&self) -> &[TableEvent] {
        self.dispatcher.get_event_history()
    }
}
