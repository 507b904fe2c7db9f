//! Shapes backend payloads into table datasets.
//!
//! The history view pivots the per-day records: one row per symptom, one
//! column per distinct date, plus a trailing "Total" row.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use crate::api::{DailyRecord, Event, Symptom, SymptomRecord};
use crate::data::datatable::{CellValue, Column, Row};

pub const LABEL_COLUMN: &str = "symptom";
pub const LABEL_HEADER: &str = "Data/Registro";
pub const TOTAL_LABEL: &str = "Total";

/// Pivoted history ready for [`crate::data::records_table::RecordsTable::load_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct PivotHistory {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub distinct_dates: usize,
}

impl PivotHistory {
    /// Page that shows the most recent dates
    pub fn last_page(&self, columns_per_page: usize) -> usize {
        self.distinct_dates.div_ceil(columns_per_page.max(1)).max(1)
    }
}

/// "headache" -> "Headache"
pub fn capitalize_first_letter(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "2024-05-01" -> "01/05"; anything else is returned unchanged
pub fn short_date_label(iso_date: &str) -> String {
    let parts: Vec<&str> = iso_date.split('-').collect();
    if parts.len() == 3 {
        format!("{}/{}", parts[2], parts[1])
    } else {
        iso_date.to_string()
    }
}

/// "2024-05-01" -> "01/05/2024"; unparseable input is returned unchanged
pub fn display_date(iso_date: &str) -> String {
    NaiveDate::parse_from_str(iso_date, "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| iso_date.to_string())
}

/// Pivot the daily records into one row per symptom plus a totals row.
///
/// Symptom rows follow the order of `symptoms`; date columns follow the
/// order in which dates first appear in `records`. With no records the
/// result only has the label column and no rows.
pub fn build_records_pivot(symptoms: &[Symptom], records: &[DailyRecord]) -> PivotHistory {
    let mut columns = vec![Column::new(LABEL_COLUMN).with_label(LABEL_HEADER)];

    if records.is_empty() {
        return PivotHistory {
            rows: Vec::new(),
            columns,
            distinct_dates: 0,
        };
    }

    let mut rows: Vec<Row> = symptoms
        .iter()
        .map(|symptom| {
            let mut row = Row::new().with(LABEL_COLUMN, capitalize_first_letter(&symptom.name));
            for record in records.iter().filter(|r| r.symptom_name == symptom.name) {
                row.set(record.date.clone(), CellValue::Number(record.average_value));
            }
            row
        })
        .collect();

    let mut seen = HashSet::new();
    let dates: Vec<&str> = records
        .iter()
        .map(|r| r.date.as_str())
        .filter(|d| seen.insert(*d))
        .collect();

    let mut total = Row::new().with(LABEL_COLUMN, TOTAL_LABEL);
    for date in &dates {
        columns.push(Column::new(*date).with_label(short_date_label(date)));
        let date_total: f64 = records
            .iter()
            .filter(|r| r.date == *date)
            .map(|r| r.average_value)
            .sum();
        total.set(*date, date_total);
    }
    rows.push(total);

    debug!(
        target: "records_builder",
        "Pivoted {} records into {} rows x {} dates",
        records.len(),
        rows.len(),
        dates.len()
    );

    PivotHistory {
        rows,
        columns,
        distinct_dates: dates.len(),
    }
}

/// Events as a list: date and "description [HH:MMh]"
pub fn build_events_list(events: &[Event]) -> (Vec<Row>, Vec<Column>) {
    let rows = events
        .iter()
        .map(|event| {
            Row::new()
                .with("id", event.id as f64)
                .with("date", display_date(&event.date))
                .with("raw_date", event.date.clone())
                .with("time", event.time.clone())
                .with("description", event.description.clone())
                .with("event", format!("{} [{}h]", event.description, event.time))
        })
        .collect();
    let columns = vec![
        Column::new("date").with_label("Data"),
        Column::new("event").with_label("Evento"),
    ];
    (rows, columns)
}

/// Every value logged for one symptom
pub fn build_symptom_records_list(records: &[SymptomRecord]) -> (Vec<Row>, Vec<Column>) {
    let rows = records
        .iter()
        .map(|record| {
            Row::new()
                .with("id", record.id as f64)
                .with("symptom_name", record.symptom_name.clone())
                .with("date", display_date(&record.date))
                .with("raw_date", record.date.clone())
                .with("time", record.time.clone())
                .with("value", record.value)
        })
        .collect();
    let columns = vec![
        Column::new("symptom_name").with_label("Sintoma"),
        Column::new("date").with_label("Data"),
        Column::new("time").with_label("Hora"),
        Column::new("value").with_label("Valor"),
    ];
    (rows, columns)
}

pub fn build_symptoms_list(symptoms: &[Symptom]) -> (Vec<Row>, Vec<Column>) {
    let rows = symptoms
        .iter()
        .map(|symptom| {
            Row::new()
                .with("id", symptom.id as f64)
                .with("name", capitalize_first_letter(&symptom.name))
                .with("order", symptom.order as f64)
        })
        .collect();
    (rows, vec![Column::new("name").with_label("Sintoma")])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptom(id: i64, name: &str) -> Symptom {
        Symptom {
            id,
            name: name.to_string(),
            order: id,
        }
    }

    fn record(symptom_id: i64, name: &str, date: &str, value: f64) -> DailyRecord {
        DailyRecord {
            id: 0,
            date: date.to_string(),
            time: "08:00".to_string(),
            symptom_id,
            symptom_name: name.to_string(),
            average_value: value,
            total_value: value,
        }
    }

    #[test]
    fn test_capitalize_first_letter() {
        assert_eq!(capitalize_first_letter("headache"), "Headache");
        assert_eq!(capitalize_first_letter("ânsia"), "Ânsia");
        assert_eq!(capitalize_first_letter(""), "");
    }

    #[test]
    fn test_date_labels() {
        assert_eq!(short_date_label("2024-05-01"), "01/05");
        assert_eq!(short_date_label("yesterday"), "yesterday");
        assert_eq!(display_date("2024-05-01"), "01/05/2024");
        assert_eq!(display_date("bad"), "bad");
    }

    #[test]
    fn test_empty_records_only_label_column() {
        let pivot = build_records_pivot(&[symptom(1, "headache")], &[]);
        assert!(pivot.rows.is_empty());
        assert_eq!(pivot.columns.len(), 1);
        assert_eq!(pivot.last_page(14), 1);
    }

    #[test]
    fn test_pivot_dates_in_first_seen_order() {
        let pivot = build_records_pivot(
            &[symptom(1, "headache")],
            &[
                record(1, "headache", "2024-05-02", 1.0),
                record(1, "headache", "2024-05-01", 2.0),
                record(1, "headache", "2024-05-02", 3.0),
            ],
        );
        let ids: Vec<&str> = pivot.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![LABEL_COLUMN, "2024-05-02", "2024-05-01"]);
        assert_eq!(pivot.distinct_dates, 2);
        // Later duplicates overwrite earlier ones in the symptom row
        assert_eq!(pivot.rows[0].number("2024-05-02"), Some(3.0));
        // ...but both count toward the total
        assert_eq!(pivot.rows[1].number("2024-05-02"), Some(4.0));
    }
}
