use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Placeholder shown for a missing or blank cell in the records table
pub const MISSING_CELL: &str = "-";

/// Column metadata: `id` is the lookup key into a row, `label` is what gets displayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Column {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label used for headers, falling back to the id
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.id,
        }
    }
}

/// A single scalar cell value as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    /// Lenient numeric reading of the value.
    ///
    /// Numbers are taken as-is, text goes through [`parse_float`], null yields `None`.
    pub fn parse_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_float(s),
            CellValue::Null => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// Falsy in the loose sense used by the table renderers: null, blank text, NaN and zero
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            CellValue::Text(s) => s.is_empty(),
            CellValue::Null => true,
        }
    }

    /// Zero is the one falsy value that is still shown as data
    fn is_zero(&self) -> bool {
        matches!(self, CellValue::Number(n) if *n == 0.0)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Text for a records-table cell: `-` for anything falsy except zero
pub fn pivot_cell_text(value: Option<&CellValue>) -> String {
    match value {
        Some(v) if !v.is_falsy() || v.is_zero() => v.to_string(),
        _ => MISSING_CELL.to_string(),
    }
}

/// Text for a list-table cell: every falsy value (zero included) renders blank
pub fn list_cell_text(value: Option<&CellValue>) -> String {
    match value {
        Some(v) if !v.is_falsy() => v.to_string(),
        _ => String::new(),
    }
}

/// String form used by search and string sorting; an absent value reads as "undefined"
pub fn search_text(value: Option<&CellValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "undefined".to_string(),
    }
}

/// Ordering used when a table is sorted by a column: numeric when both
/// sides are numbers, otherwise a case-folded comparison of the string forms
pub fn compare_cells(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    match (a, b) {
        (Some(CellValue::Number(x)), Some(CellValue::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        _ => {
            let (left, right) = (search_text(a), search_text(b));
            left.to_lowercase()
                .cmp(&right.to_lowercase())
                .then_with(|| left.cmp(&right))
        }
    }
}

/// A sparse row: column id -> value. Any column may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: HashMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column_id, value);
        self
    }

    pub fn set(&mut self, column_id: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(column_id.into(), value.into());
    }

    pub fn get(&self, column_id: &str) -> Option<&CellValue> {
        self.values.get(column_id)
    }

    pub fn number(&self, column_id: &str) -> Option<f64> {
        self.get(column_id).and_then(CellValue::parse_number)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows and columns of one table load. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>, columns: Vec<Column>) -> Self {
        Self { rows, columns }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get_column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    /// Debug dump used by the REPL and test failures
    pub fn pretty_print(&self) -> String {
        let mut output = format!(
            "Dataset: {} rows x {} columns\n",
            self.row_count(),
            self.column_count()
        );
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| search_text(row.get(&c.id)))
                .collect();
            output.push_str(&format!("  [{}] {}\n", i, cells.join(" | ")));
        }
        output
    }
}

/// Lenient float parsing: skips leading whitespace and reads the longest
/// numeric prefix, so `"5abc"` is 5 and `"abc"` is `None`.
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        pos += 1;
    }

    if s[pos..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut digits = pos - int_start;

    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            pos = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            pos = exp_end;
        }
    }

    s[..pos].parse::<f64>().ok()
}

/// Shortest round-trip rendering of a number (`5`, `2.5`, `-0.25`).
///
/// Magnitudes of at least 1e21 or below 1e-6 switch to exponent form with
/// an explicit exponent sign (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let exponent_form = format!("{:e}", value);
        match exponent_form.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => exponent_form,
        }
    } else {
        format!("{}", value)
    }
}

/// Fixed-point rendering with exact ties rounded away from zero (`0.125` -> `0.13`).
/// Any negative input keeps its sign, so `-0.001` renders as `-0.00`.
pub fn format_fixed(value: f64, digits: usize) -> String {
    // Too large for fixed-point; shown like any other number
    if !value.is_finite() || value.abs() >= 1e21 {
        return format_number(value);
    }

    // Exact decimal expansion; a tie shows up as a lone trailing 5
    let expanded = format!("{:.*}", digits + 24, value.abs());
    let cut = expanded.len() - 24;
    let tail = &expanded[cut..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    let magnitude = if is_tie {
        let step = 10f64.powi(digits as i32);
        let rounded_up = (value.abs() * step).floor() + 1.0;
        format!("{:.*}", digits, rounded_up / step)
    } else {
        format!("{:.*}", digits, value.abs())
    };

    if value < 0.0 {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_prefixes() {
        assert_eq!(parse_float("5"), Some(5.0));
        assert_eq!(parse_float("  7.5"), Some(7.5));
        assert_eq!(parse_float("5abc"), Some(5.0));
        assert_eq!(parse_float("-.5"), Some(-0.5));
        assert_eq!(parse_float("3."), Some(3.0));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("2e"), Some(2.0));
        assert_eq!(parse_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("   "), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
    }

    #[test]
    fn test_cell_value_from_json() {
        let row: Row = serde_json::from_str(r#"{"a": 1.5, "b": "x", "c": null}"#).unwrap();
        assert_eq!(row.get("a"), Some(&CellValue::Number(1.5)));
        assert_eq!(row.get("b"), Some(&CellValue::Text("x".to_string())));
        assert_eq!(row.get("c"), Some(&CellValue::Null));
        assert_eq!(row.get("d"), None);
    }

    #[test]
    fn test_pivot_cell_text() {
        assert_eq!(pivot_cell_text(None), "-");
        assert_eq!(pivot_cell_text(Some(&CellValue::Null)), "-");
        assert_eq!(pivot_cell_text(Some(&CellValue::Text(String::new()))), "-");
        assert_eq!(pivot_cell_text(Some(&CellValue::Number(0.0))), "0");
        assert_eq!(pivot_cell_text(Some(&CellValue::Number(4.5))), "4.5");
        assert_eq!(pivot_cell_text(Some(&CellValue::Text("abc".into()))), "abc");
    }

    #[test]
    fn test_list_cell_text_blanks_zero() {
        assert_eq!(list_cell_text(Some(&CellValue::Number(0.0))), "");
        assert_eq!(list_cell_text(None), "");
        assert_eq!(list_cell_text(Some(&CellValue::Number(3.0))), "3");
    }

    #[test]
    fn test_search_text() {
        assert_eq!(search_text(None), "undefined");
        assert_eq!(search_text(Some(&CellValue::Null)), "null");
        assert_eq!(search_text(Some(&CellValue::Number(2.0))), "2");
    }

    #[test]
    fn test_compare_cells() {
        let two = CellValue::Number(2.0);
        let ten = CellValue::Number(10.0);
        assert_eq!(compare_cells(Some(&two), Some(&ten)), Ordering::Less);
        // Text compares as text, so "10" sorts before "2"
        let two_text = CellValue::Text("2".into());
        let ten_text = CellValue::Text("10".into());
        assert_eq!(compare_cells(Some(&two_text), Some(&ten_text)), Ordering::Greater);
        let apple = CellValue::Text("apple".into());
        let banana = CellValue::Text("Banana".into());
        assert_eq!(compare_cells(Some(&apple), Some(&banana)), Ordering::Less);
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(5.0, 2), "5.00");
        assert_eq!(format_fixed(16.0 / 3.0, 2), "5.33");
        assert_eq!(format_fixed(0.125, 2), "0.13");
        assert_eq!(format_fixed(-0.125, 2), "-0.13");
        assert_eq!(format_fixed(2.675, 2), "2.67"); // binary value sits below the tie
        assert_eq!(format_fixed(-0.001, 2), "-0.00");
        assert_eq!(format_fixed(-0.0, 2), "0.00");
        assert_eq!(format_fixed(6.0, 2), "6.00");
    }

    #[test]
    fn test_format_number_exponent_range() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(CellValue::Number(1e21).to_string(), "1e+21");
        assert_eq!(search_text(Some(&CellValue::Number(1e21))), "1e+21");
        assert_eq!(format_fixed(1e21, 2), "1e+21");
    }

    #[test]
    fn test_column_label_fallback() {
        assert_eq!(Column::new("2024-05-01").display_label(), "2024-05-01");
        assert_eq!(
            Column::new("symptom").with_label("Data/Registro").display_label(),
            "Data/Registro"
        );
    }
}
