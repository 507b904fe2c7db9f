use crate::data::list_table::ListGrid;
use crate::data::records_table::RenderedGrid;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles exporting rendered tables to CSV
pub struct DataExporter;

impl DataExporter {
    /// Default export file name: `{prefix}_{timestamp}.csv`
    pub fn default_filename(prefix: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("{}_{}.csv", prefix, timestamp))
    }

    /// Write the currently visible page of the history table.
    ///
    /// Cells are written as displayed, so placeholders stay `-` and the
    /// summary average keeps its "a/b" form.
    pub fn write_grid_csv<W: Write>(grid: &RenderedGrid, writer: W) -> Result<usize> {
        if grid.is_empty {
            return Err(anyhow!("No data to export"));
        }

        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(grid.header_labels())?;
        for row in &grid.rows {
            csv.write_record(row.texts())?;
        }
        csv.flush()?;
        Ok(grid.rows.len())
    }

    /// Write the current page of a list table, without the actions column
    pub fn write_list_csv<W: Write>(grid: &ListGrid, writer: W) -> Result<usize> {
        if grid.is_empty {
            return Err(anyhow!("No data to export"));
        }

        let data_columns = grid.placeholder_span - 1;
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(grid.header.iter().take(data_columns))?;
        for row in &grid.rows {
            csv.write_record(&row.cells)?;
        }
        csv.flush()?;
        Ok(grid.rows.len())
    }

    pub fn export_grid_to_file(grid: &RenderedGrid, path: &Path) -> Result<String> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let count = Self::write_grid_csv(grid, file)?;
        info!(target: "export", "Exported {} rows to {}", count, path.display());
        Ok(format!(
            "✓ Exported {} rows to CSV file: {}",
            count,
            path.display()
        ))
    }

    pub fn export_list_to_file(grid: &ListGrid, path: &Path) -> Result<String> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let count = Self::write_list_csv(grid, file)?;
        info!(target: "export", "Exported {} rows to {}", count, path.display());
        Ok(format!(
            "✓ Exported {} rows to CSV file: {}",
            count,
            path.display()
        ))
    }
}
