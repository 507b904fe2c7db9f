use crate::data::datatable::{search_text, Column, Dataset};

/// Handles search and filter operations on table data
pub struct SearchFilter;

impl SearchFilter {
    /// Indices of the rows where any column value contains `term`,
    /// ignoring case. An empty term matches every row, in source order.
    pub fn matching_rows(dataset: &Dataset, term: &str) -> Vec<usize> {
        let term_lower = term.to_lowercase();

        dataset
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                dataset.columns.iter().any(|column| {
                    search_text(row.get(&column.id))
                        .to_lowercase()
                        .contains(&term_lower)
                })
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Find columns whose label or id contains the pattern (case-insensitive)
    pub fn find_matching_columns(columns: &[Column], pattern: &str) -> Vec<(usize, String)> {
        let pattern_lower = pattern.to_lowercase();
        let mut matching = Vec::new();

        for (idx, column) in columns.iter().enumerate() {
            if column.display_label().to_lowercase().contains(&pattern_lower)
                || column.id.to_lowercase().contains(&pattern_lower)
            {
                matching.push((idx, column.display_label().to_string()));
            }
        }

        matching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::Row;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                Row::new().with("name", "Headache").with("d1", 3.0),
                Row::new().with("name", "Nausea"),
                Row::new().with("name", "Total").with("d1", 30.0),
            ],
            vec![
                Column::new("name"),
                Column::new("d1").with_label("01/05"),
            ],
        )
    }

    #[test]
    fn test_case_insensitive_substring() {
        let data = dataset();
        assert_eq!(SearchFilter::matching_rows(&data, "HEAD"), vec![0]);
        assert_eq!(SearchFilter::matching_rows(&data, "3"), vec![0, 2]);
        assert_eq!(SearchFilter::matching_rows(&data, ""), vec![0, 1, 2]);
    }

    #[test]
    fn test_missing_values_read_as_undefined() {
        let data = dataset();
        assert_eq!(SearchFilter::matching_rows(&data, "undef"), vec![1]);
    }

    #[test]
    fn test_find_matching_columns() {
        let data = dataset();
        let found = SearchFilter::find_matching_columns(&data.columns, "01/");
        assert_eq!(found, vec![(1, "01/05".to_string())]);
    }
}
