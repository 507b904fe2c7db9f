use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::config::config::DisplayConfig;
use crate::data::list_table::ListGrid;
use crate::data::records_table::{CellKind, CellTag, GridCell, GridRow, RenderedGrid, RowTag};

fn row_color(row: &GridRow) -> Option<Color> {
    if row.has_tag(RowTag::HighestSum) {
        Some(Color::Red)
    } else if row.has_tag(RowTag::LowestSum) {
        Some(Color::Green)
    } else {
        None
    }
}

fn styled_cell(cell: &GridCell, row_color: Option<Color>, display: &DisplayConfig) -> Cell {
    let mut text = cell.text.clone();
    if !display.use_colors {
        if cell.tags.contains(&CellTag::HighestTotalValue) {
            text = format!("{} {}", text, display.icons.highest);
        }
        if cell.tags.contains(&CellTag::LowestTotalValue) {
            text = format!("{} {}", text, display.icons.lowest);
        }
        return Cell::new(text);
    }

    let mut out = Cell::new(text);
    if let Some(color) = row_color {
        out = out.fg(color);
    }
    if cell.tags.contains(&CellTag::HighestTotalValue) {
        out = out.fg(Color::Red).add_attribute(Attribute::Bold);
    } else if cell.tags.contains(&CellTag::LowestTotalValue) {
        out = out.fg(Color::Green).add_attribute(Attribute::Bold);
    }
    match cell.kind {
        CellKind::Sum | CellKind::Average => out.add_attribute(Attribute::Italic),
        CellKind::Placeholder => out.add_attribute(Attribute::Dim),
        CellKind::Value => out,
    }
}

/// Terminal projection of a records grid
pub fn build_records_table(grid: &RenderedGrid, display: &DisplayConfig) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        grid.header
            .iter()
            .map(|h| Cell::new(&h.label).add_attribute(Attribute::Bold)),
    );

    for row in &grid.rows {
        let color = row_color(row);
        let mut cells: Vec<Cell> = row
            .cells
            .iter()
            .map(|cell| styled_cell(cell, color, display))
            .collect();

        if !display.use_colors {
            let marker = if row.has_tag(RowTag::HighestSum) {
                Some(&display.icons.highest)
            } else if row.has_tag(RowTag::LowestSum) {
                Some(&display.icons.lowest)
            } else {
                None
            };
            if let (Some(marker), Some(first)) = (marker, row.cells.first()) {
                cells[0] = Cell::new(format!("{} {}", marker, first.text));
            }
        }
        table.add_row(cells);
    }

    table
}

pub fn display_records(grid: &RenderedGrid, display: &DisplayConfig) {
    println!("{}", build_records_table(grid, display));
    if !grid.is_empty {
        println!("{}", grid.pagination.label().dark_grey());
    }
}

pub fn build_list_table(grid: &ListGrid) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        grid.header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    // Actions are addressed by row position on the page
    for (position, row) in grid.rows.iter().enumerate() {
        let mut cells: Vec<Cell> = row.cells.iter().map(Cell::new).collect();
        if row.source_index.is_none() {
            cells = cells
                .into_iter()
                .map(|c| c.add_attribute(Attribute::Dim))
                .collect();
        } else if !row.actions.is_empty() {
            let actions: Vec<&str> = row.actions.iter().map(|a| a.label()).collect();
            let id = row.attribute("id").unwrap_or("?");
            cells.push(
                Cell::new(format!("{}: {} (#{})", position + 1, actions.join(" | "), id))
                    .fg(Color::DarkGrey),
            );
        }
        table.add_row(cells);
    }

    table
}

pub fn display_list(grid: &ListGrid) {
    println!("{}", build_list_table(grid));
    if !grid.is_empty {
        println!("{}", grid.pagination.label().dark_grey());
    }
}
