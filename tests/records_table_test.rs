use std::cell::RefCell;
use std::rc::Rc;

use symptom_cli::data::datatable::{Column, Dataset, Row};
use symptom_cli::data::records_table::{
    CellKind, CellTag, RecordsTable, RowTag, TableOptions, EMPTY_MESSAGE,
};
use symptom_cli::data::view_state::ViewState;
use symptom_cli::state::dispatcher::RenderObserver;
use symptom_cli::state::events::{EngineSnapshot, TableEvent};

fn columns(dates: usize) -> Vec<Column> {
    let mut cols = vec![Column::new("symptom").with_label("Data/Registro")];
    for day in 1..=dates {
        cols.push(Column::new(format!("d{}", day)).with_label(format!("{:02}/05", day)));
    }
    cols
}

/// Two symptoms over two dates plus the totals row
fn two_by_two() -> (Vec<Row>, Vec<Column>) {
    let rows = vec![
        Row::new().with("symptom", "Headache").with("d1", 1.0).with("d2", 2.0),
        Row::new().with("symptom", "Nausea").with("d1", 5.0).with("d2", 1.0),
        Row::new().with("symptom", "Total").with("d1", 6.0).with("d2", 3.0),
    ];
    (rows, columns(2))
}

fn table(per_page: usize, options: TableOptions) -> RecordsTable {
    RecordsTable::new(ViewState::new(1, per_page), options)
}

#[test]
fn test_label_column_stays_pinned_across_pages() {
    let rows = vec![
        Row::new()
            .with("symptom", "Headache")
            .with("d1", 1.0)
            .with("d2", 2.0)
            .with("d3", 3.0)
            .with("d4", 4.0)
            .with("d5", 5.0),
        Row::new().with("symptom", "Total").with("d5", 5.0),
    ];
    let mut table = table(2, TableOptions::default());
    table.load_data(rows, columns(5), 1);

    assert_eq!(table.pagination().total_pages, 3);
    assert_eq!(
        table.last_render().unwrap().header_labels(),
        vec!["Data/Registro", "01/05", "02/05", "Total"]
    );

    assert!(table.next_page());
    assert!(table.next_page());
    let grid = table.last_render().unwrap();
    assert_eq!(grid.header_labels(), vec!["Data/Registro", "05/05", "Total"]);
    assert_eq!(grid.pagination.label(), "Página 3 de 3");
    assert!(!table.next_page());
    assert_eq!(table.view().current_page, 3);
}

#[test]
fn test_out_of_range_page_shows_only_pinned_columns() {
    let (rows, cols) = two_by_two();
    let mut table = table(2, TableOptions::default());
    table.load_data(rows, cols, 1);

    let grid = table.set_page(9);
    assert_eq!(grid.header_labels(), vec!["Data/Registro", "Total"]);
    // Only labels are visible, so no row has a numeric value to show
    assert!(grid.rows.is_empty());
    assert_eq!(grid.pagination.label(), "Página 9 de 1");
}

#[test]
fn test_row_aggregates_and_extrema() {
    let (rows, cols) = two_by_two();
    let mut table = table(
        14,
        TableOptions {
            show_row_average: true,
            ..TableOptions::default()
        },
    );
    let grid = table.load_data(rows, cols, 1).clone();

    assert_eq!(grid.rows.len(), 3);
    assert_eq!(
        grid.rows[0].texts(),
        vec!["Headache", "1", "2", "3.00", "1.50"]
    );
    assert_eq!(grid.rows[1].texts(), vec!["Nausea", "5", "1", "6.00", "3.00"]);
    assert_eq!(grid.rows[2].texts(), vec!["Total", "6", "3", "9.00", "4.50/2.25"]);

    assert!(grid.rows[1].has_tag(RowTag::HighestSum));
    assert!(grid.rows[0].has_tag(RowTag::LowestSum));
    assert!(grid.rows[2].tags.is_empty());

    let total = &grid.rows[2];
    assert_eq!(total.cells[1].tags, vec![CellTag::HighestTotalValue]);
    assert_eq!(total.cells[2].tags, vec![CellTag::LowestTotalValue]);
    assert_eq!(total.cells[3].kind, CellKind::Sum);
    assert_eq!(total.cells[4].kind, CellKind::Average);
}

#[test]
fn test_tied_extrema_tag_every_matching_row() {
    let rows = vec![
        Row::new().with("symptom", "Headache").with("d1", 4.5).with("d2", 0.5),
        Row::new().with("symptom", "Nausea").with("d2", 5.0),
        Row::new().with("symptom", "Fatigue").with("d1", 1.0).with("d2", 1.0),
        Row::new().with("symptom", "Dizziness").with("d1", 1.0),
        Row::new().with("symptom", "Total").with("d1", 6.5).with("d2", 6.5),
    ];
    let mut table = table(14, TableOptions::default());
    let grid = table.load_data(rows, columns(2), 1);

    // Headache and Nausea both sum to 5; Fatigue and Dizziness both average 1
    let tagged = |tag: RowTag| {
        grid.rows
            .iter()
            .filter(|r| r.has_tag(tag))
            .map(|r| r.cells[0].text.as_str())
            .collect::<Vec<_>>()
    };
    assert_eq!(tagged(RowTag::HighestSum), vec!["Headache", "Nausea"]);
    assert_eq!(tagged(RowTag::LowestSum), vec!["Fatigue", "Dizziness"]);
    assert!(grid.rows[4].tags.is_empty());

    let total = &grid.rows[4];
    assert_eq!(
        total.cells[1].tags,
        vec![CellTag::HighestTotalValue, CellTag::LowestTotalValue]
    );
    assert!(total.cells[2].tags.is_empty());
}

#[test]
fn test_render_is_idempotent_across_page_round_trips() {
    let (rows, cols) = two_by_two();
    let mut table = table(1, TableOptions::default());
    let first = table.load_data(rows, cols, 1).clone();

    assert_eq!(table.render(), &first);
    assert_eq!(table.render(), &first);

    assert!(table.next_page());
    assert_ne!(table.last_render(), Some(&first));
    assert!(table.previous_page());
    assert_eq!(table.last_render(), Some(&first));
}

#[test]
fn test_row_tags_need_the_sum_column() {
    let (rows, cols) = two_by_two();
    let mut table = table(
        14,
        TableOptions {
            show_row_sum: false,
            ..TableOptions::default()
        },
    );
    let grid = table.load_data(rows, cols, 1);
    assert!(grid.rows.iter().all(|r| r.tags.is_empty()));
    assert_eq!(grid.header_labels(), vec!["Data/Registro", "01/05", "02/05"]);
}

#[test]
fn test_missing_and_zero_cells() {
    let rows = vec![
        Row::new().with("symptom", "Headache").with("d1", 0.0),
        Row::new().with("symptom", "Nausea").with("d2", 3.0),
        Row::new().with("symptom", "Total").with("d1", 0.0).with("d2", 3.0),
    ];
    let mut table = table(14, TableOptions::default());
    let grid = table.load_data(rows, columns(2), 1);

    assert_eq!(grid.rows[0].texts(), vec!["Headache", "0", "-", "0.00"]);
    assert_eq!(grid.rows[1].texts(), vec!["Nausea", "-", "3", "3.00"]);
}

#[test]
fn test_rows_without_values_on_the_page_are_hidden() {
    let rows = vec![
        Row::new().with("symptom", "Headache").with("d1", 2.0),
        Row::new().with("symptom", "Nausea").with("d2", 4.0),
        Row::new().with("symptom", "Total").with("d1", 2.0).with("d2", 4.0),
    ];
    let mut table = table(1, TableOptions::default());
    let grid = table.load_data(rows, columns(2), 1);

    let labels: Vec<&str> = grid.rows.iter().map(|r| r.cells[0].text.as_str()).collect();
    assert_eq!(labels, vec!["Headache", "Total"]);
    assert!(grid.row_for_source(1).is_none());

    table.next_page();
    let grid = table.last_render().unwrap();
    let labels: Vec<&str> = grid.rows.iter().map(|r| r.cells[0].text.as_str()).collect();
    assert_eq!(labels, vec!["Nausea", "Total"]);
}

#[test]
fn test_empty_dataset_renders_placeholder() {
    let mut table = table(14, TableOptions::default());
    let grid = table.load_data(Vec::new(), columns(0), 1);

    assert!(grid.is_empty);
    assert_eq!(grid.rows.len(), 1);
    let placeholder = &grid.rows[0].cells[0];
    assert_eq!(placeholder.text, EMPTY_MESSAGE);
    assert_eq!(placeholder.kind, CellKind::Placeholder);
    assert_eq!(placeholder.col_span, grid.header.len());
}

#[test]
fn test_search_filters_rows_and_keeps_page() {
    let rows = vec![
        Row::new().with("symptom", "Headache").with("d1", 1.0).with("d2", 2.0).with("d3", 3.0),
        Row::new().with("symptom", "Nausea").with("d1", 2.0).with("d3", 1.0),
        Row::new().with("symptom", "Total").with("d1", 3.0).with("d2", 2.0).with("d3", 4.0),
    ];
    let mut table = table(2, TableOptions::default());
    table.load_data(rows, columns(3), 2);

    table.search("NAUSEA");
    assert_eq!(table.view().current_page, 2);
    assert_eq!(table.filtered_rows().count(), 1);

    // Nausea has no value for d2, which reads as "undefined" when searched
    table.search("undefined");
    let names: Vec<String> = table
        .filtered_rows()
        .map(|r| r.get("symptom").unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Nausea"]);

    table.search("");
    assert_eq!(table.filtered_rows().count(), 3);
}

#[test]
fn test_clearing_search_restores_source_order_after_sort() {
    let (rows, cols) = two_by_two();
    let mut table = table(
        14,
        TableOptions {
            sortable: true,
            ..TableOptions::default()
        },
    );
    table.load_data(rows.clone(), cols, 1);

    table.sort_by("d2");
    let sorted: Vec<String> = table
        .filtered_rows()
        .map(|r| r.get("symptom").unwrap().to_string())
        .collect();
    assert_eq!(sorted, vec!["Nausea", "Headache", "Total"]);

    table.search("nausea");
    assert_eq!(table.filtered_rows().count(), 1);

    let grid = table.search("").clone();
    let restored: Vec<Row> = table.filtered_rows().cloned().collect();
    assert_eq!(restored, rows);
    assert_eq!(grid.rows[0].texts(), vec!["Headache", "1", "2", "3.00"]);
    assert_eq!(grid.rows[1].texts(), vec!["Nausea", "5", "1", "6.00"]);
    assert_eq!(grid.rows[2].texts(), vec!["Total", "6", "3", "9.00"]);
}

#[test]
fn test_sort_only_when_enabled() {
    let (rows, cols) = two_by_two();
    let mut locked = table(14, TableOptions::default());
    locked.load_data(rows.clone(), cols.clone(), 1);
    locked.sort_by("d1");
    assert!(!locked
        .event_history()
        .iter()
        .any(|e| matches!(e, TableEvent::Sorted { .. })));

    let mut sortable = table(
        14,
        TableOptions {
            sortable: true,
            ..TableOptions::default()
        },
    );
    sortable.load_data(rows, cols, 1);
    let grid = sortable.sort_by("d2");
    let labels: Vec<&str> = grid.rows.iter().map(|r| r.cells[0].text.as_str()).collect();
    assert_eq!(labels, vec!["Nausea", "Headache", "Total"]);
}

struct SnapshotRecorder {
    seen: Rc<RefCell<Vec<EngineSnapshot>>>,
}

impl RenderObserver for SnapshotRecorder {
    fn on_rendered(&mut self, _dataset: &Dataset, _columns: &[Column], snapshot: &EngineSnapshot) {
        self.seen.borrow_mut().push(snapshot.clone());
    }

    fn name(&self) -> &str {
        "SnapshotRecorder"
    }
}

#[test]
fn test_observers_follow_non_empty_renders() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut table = table(1, TableOptions::default());
    table.subscribe(Box::new(SnapshotRecorder { seen: seen.clone() }));

    table.load_data(Vec::new(), columns(2), 1);
    assert!(seen.borrow().is_empty());

    let (rows, cols) = two_by_two();
    table.load_data(rows, cols, 1);
    assert!(table.next_page());
    assert!(!table.next_page());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].visible_column_ids, vec!["symptom", "d1"]);
    assert_eq!(seen[1].visible_column_ids, vec!["symptom", "d2"]);
    assert_eq!(seen[1].pagination.current_page, 2);
    assert_eq!(seen[1].filtered_row_count, 3);
}

#[test]
fn test_page_of_column() {
    let (rows, cols) = two_by_two();
    let mut table = table(1, TableOptions::default());
    table.load_data(rows, cols, 1);
    assert_eq!(table.page_of_column(0), None);
    assert_eq!(table.page_of_column(1), Some(1));
    assert_eq!(table.page_of_column(2), Some(2));
    assert_eq!(table.page_of_column(3), None);
}
