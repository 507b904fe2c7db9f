//! Input validation for the add/edit commands.
//!
//! Each form is a list of [`FormField`]s; [`FormValidator::validate`] checks
//! them in order and stops at the first failure, returning the JSON body
//! the backend expects.

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::api::BatchValue;
use crate::data::datatable::parse_float;

pub const DATE_MASK: &str = "[00]/[00]/[0000]";
pub const TIME_MASK: &str = "[00]:[00]";

pub const BATCH_EMPTY_MESSAGE: &str = "Insira pela menos um valor para fazer a inserção em lote";
pub const BATCH_RANGE_MESSAGE: &str = "O valor do registro deve estar entre 0 e 10";

static DATE_RE: OnceLock<Regex> = OnceLock::new();
static TIME_RE: OnceLock<Regex> = OnceLock::new();
static CEP_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static date pattern"))
}

fn time_re() -> &'static Regex {
    TIME_RE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("static time pattern"))
}

fn cep_re() -> &'static Regex {
    CEP_RE.get_or_init(|| Regex::new(r"^[0-9]{5}-[0-9]{3}$").expect("static CEP pattern"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Float { min: Option<f64>, max: Option<f64> },
    /// `dd/mm/yyyy`, sent as `yyyy-mm-dd`
    Date,
    /// `HH:MM`
    Time,
    /// Brazilian postal code, `#####-###`
    Cep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn required_error(&self) -> ValidationError {
        ValidationError::new(&self.key, format!("O campo \"{}\" é obrigatório", self.label))
    }

    fn format_error(&self) -> ValidationError {
        ValidationError::new(&self.key, format!("O campo \"{}\" está num formato inválido", self.label))
    }

    fn invalid_error(&self) -> ValidationError {
        ValidationError::new(&self.key, format!("O campo \"{}\" está inválido", self.label))
    }

    fn convert(&self, raw: &str) -> Result<Value, ValidationError> {
        match &self.kind {
            FieldKind::String => Ok(Value::String(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.invalid_error()),
            FieldKind::Float { min, max } => {
                let value = parse_float(raw).ok_or_else(|| self.invalid_error())?;
                if min.is_some_and(|m| value < m) || max.is_some_and(|m| value > m) {
                    return Err(self.invalid_error());
                }
                Ok(json!(value))
            }
            FieldKind::Date => {
                if !date_re().is_match(raw) {
                    return Err(self.format_error());
                }
                NaiveDate::parse_from_str(raw, "%d/%m/%Y")
                    .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                    .map_err(|_| self.invalid_error())
            }
            FieldKind::Time => {
                if !time_re().is_match(raw) {
                    return Err(self.format_error());
                }
                NaiveTime::parse_from_str(raw, "%H:%M")
                    .map(|_| Value::String(raw.to_string()))
                    .map_err(|_| self.invalid_error())
            }
            FieldKind::Cep => {
                if !cep_re().is_match(raw) {
                    return Err(self.format_error());
                }
                Ok(Value::String(raw.to_string()))
            }
        }
    }
}

/// First validation failure of a form
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormValidator {
    fields: Vec<FormField>,
}

impl FormValidator {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Validate raw inputs keyed by field key.
    ///
    /// Empty optional fields are left out of the result.
    pub fn validate(&self, values: &HashMap<String, String>) -> Result<Map<String, Value>, ValidationError> {
        let mut body = Map::new();

        for field in &self.fields {
            let raw = values.get(&field.key).map(String::as_str).unwrap_or("");
            if raw.is_empty() {
                if field.required {
                    return Err(field.required_error());
                }
                continue;
            }
            body.insert(field.key.clone(), field.convert(raw)?);
        }

        Ok(body)
    }
}

// Forms used by the CLI

pub fn login_form() -> FormValidator {
    FormValidator::new(vec![
        FormField::new("username", "Usuário", FieldKind::String),
        FormField::new("password", "Senha", FieldKind::String),
    ])
}

/// Sign-up form; on account edits the password may stay empty
pub fn user_form(editing: bool) -> FormValidator {
    let password = FormField::new("password", "Senha", FieldKind::String);
    FormValidator::new(vec![
        FormField::new("username", "Usuário", FieldKind::String),
        FormField::new("email", "E-mail", FieldKind::String),
        FormField::new("cep", "CEP", FieldKind::Cep),
        FormField::new("city", "Cidade", FieldKind::String),
        FormField::new("state", "Estado", FieldKind::String),
        if editing { password.optional() } else { password },
    ])
}

pub fn symptom_form() -> FormValidator {
    FormValidator::new(vec![FormField::new("name", "Sintoma", FieldKind::String)])
}

/// New record form; edits use [`record_edit_form`] which has no symptom
pub fn record_form() -> FormValidator {
    let mut fields = vec![FormField::new("symptom_id", "Sintoma", FieldKind::Integer)];
    fields.extend(record_edit_form().fields);
    FormValidator::new(fields)
}

pub fn record_edit_form() -> FormValidator {
    FormValidator::new(vec![
        FormField::new("date", "Data", FieldKind::Date),
        FormField::new("time", "Hora", FieldKind::Time),
        FormField::new(
            "value",
            "Valor",
            FieldKind::Float {
                min: Some(0.0),
                max: Some(10.0),
            },
        ),
    ])
}

pub fn event_form() -> FormValidator {
    FormValidator::new(vec![
        FormField::new("description", "Descrição", FieldKind::String),
        FormField::new("date", "Data", FieldKind::Date),
        FormField::new("time", "Hora", FieldKind::Time),
    ])
}

/// Collect the per-symptom values of a batch insert.
///
/// Blank, unparseable and zero values are skipped; anything outside
/// [0, 10] rejects the whole batch, as does a batch with no values.
pub fn validate_batch_values(inputs: &[(i64, &str)]) -> Result<Vec<BatchValue>, ValidationError> {
    let mut values = Vec::new();

    for (symptom_id, raw) in inputs {
        let value = match parse_float(raw) {
            Some(v) if v != 0.0 => v,
            _ => continue,
        };
        if !(0.0..=10.0).contains(&value) {
            return Err(ValidationError::new("batch_records", BATCH_RANGE_MESSAGE.to_string()));
        }
        values.push(BatchValue {
            symptom_id: *symptom_id,
            value,
        });
    }

    if values.is_empty() {
        return Err(ValidationError::new("batch_records", BATCH_EMPTY_MESSAGE.to_string()));
    }
    Ok(values)
}

/// Full body of `/add-batch-records`
pub fn batch_request(
    date: &str,
    time: &str,
    inputs: &[(i64, &str)],
) -> Result<Map<String, Value>, ValidationError> {
    let values = validate_batch_values(inputs)?;

    let form = FormValidator::new(vec![
        FormField::new("date", "Data", FieldKind::Date),
        FormField::new("time", "Hora", FieldKind::Time),
    ]);
    let raw: HashMap<String, String> = [("date", date), ("time", time)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut body = form.validate(&raw)?;
    body.insert("batch_records".to_string(), json!(values));
    Ok(body)
}

/// Format typed digits through a mask such as `[00]/[00]/[0000]`.
///
/// Non-digit input is dropped; a literal is only emitted when another
/// digit follows it, and digits beyond the mask are ignored.
pub fn apply_mask(mask: &str, input: &str) -> String {
    let mut digits = input.chars().filter(char::is_ascii_digit).peekable();
    let mut out = String::new();
    let mut in_slot = false;

    for c in mask.chars() {
        match c {
            '[' => in_slot = true,
            ']' => in_slot = false,
            '0' if in_slot => match digits.next() {
                Some(d) => out.push(d),
                None => break,
            },
            literal => {
                if digits.peek().is_none() {
                    break;
                }
                out.push(literal);
            }
        }
    }

    out
}

pub fn format_default_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// "08:05"; the time field only accepts two-digit hours
pub fn format_default_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Today's date and the current time, as prefilled in the input prompts
pub fn current_defaults() -> (String, String) {
    let now = Local::now();
    (
        format_default_date(now.date_naive()),
        format_default_time(now.time()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_record_form_converts_values() {
        let body = record_form()
            .validate(&inputs(&[
                ("symptom_id", "3"),
                ("date", "01/05/2024"),
                ("time", "08:30"),
                ("value", "7.5"),
            ]))
            .unwrap();
        assert_eq!(body["symptom_id"], json!(3));
        assert_eq!(body["date"], json!("2024-05-01"));
        assert_eq!(body["time"], json!("08:30"));
        assert_eq!(body["value"], json!(7.5));
    }

    #[test]
    fn test_first_failure_wins() {
        let err = event_form()
            .validate(&inputs(&[("date", "1/5/2024"), ("time", "")]))
            .unwrap_err();
        assert_eq!(err.message, "O campo \"Descrição\" é obrigatório");

        let err = event_form()
            .validate(&inputs(&[("description", "Café"), ("date", "1/5/2024"), ("time", "")]))
            .unwrap_err();
        assert_eq!(err.field, "date");
        assert_eq!(err.message, "O campo \"Data\" está num formato inválido");
    }

    #[test]
    fn test_impossible_date_and_time() {
        let form = record_edit_form();
        let err = form
            .validate(&inputs(&[("date", "31/02/2024"), ("time", "08:00"), ("value", "1")]))
            .unwrap_err();
        assert_eq!(err.message, "O campo \"Data\" está inválido");

        let err = form
            .validate(&inputs(&[("date", "01/02/2024"), ("time", "25:00"), ("value", "1")]))
            .unwrap_err();
        assert_eq!(err.message, "O campo \"Hora\" está inválido");
    }

    #[test]
    fn test_float_range() {
        let form = record_edit_form();
        let base = [("date", "01/02/2024"), ("time", "08:00")];
        for bad in ["11", "-1", "abc"] {
            let mut values = inputs(&base);
            values.insert("value".to_string(), bad.to_string());
            let err = form.validate(&values).unwrap_err();
            assert_eq!(err.message, "O campo \"Valor\" está inválido", "value {}", bad);
        }
        let mut values = inputs(&base);
        values.insert("value".to_string(), "10".to_string());
        assert!(form.validate(&values).is_ok());
    }

    #[test]
    fn test_cep_and_optional_password() {
        let mut values = inputs(&[
            ("username", "ana"),
            ("email", "ana@example.com"),
            ("cep", "01001000"),
            ("city", "São Paulo"),
            ("state", "SP"),
        ]);
        let err = user_form(true).validate(&values).unwrap_err();
        assert_eq!(err.message, "O campo \"CEP\" está num formato inválido");

        values.insert("cep".to_string(), "01001-000".to_string());
        let body = user_form(true).validate(&values).unwrap();
        assert!(!body.contains_key("password"));

        let err = user_form(false).validate(&values).unwrap_err();
        assert_eq!(err.message, "O campo \"Senha\" é obrigatório");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let err = login_form().validate(&inputs(&[("username", "ana")])).unwrap_err();
        assert_eq!(err.field, "password");
    }

    #[test]
    fn test_batch_skips_blank_and_zero() {
        let values = validate_batch_values(&[(1, ""), (2, "0"), (3, "4.5"), (4, "x")]).unwrap();
        assert_eq!(
            values,
            vec![BatchValue {
                symptom_id: 3,
                value: 4.5
            }]
        );
    }

    #[test]
    fn test_batch_rejections() {
        assert_eq!(
            validate_batch_values(&[(1, ""), (2, "0")]).unwrap_err().message,
            BATCH_EMPTY_MESSAGE
        );
        assert_eq!(
            validate_batch_values(&[(1, "3"), (2, "12")]).unwrap_err().message,
            BATCH_RANGE_MESSAGE
        );
    }

    #[test]
    fn test_batch_request_body() {
        let body = batch_request("02/05/2024", "21:15", &[(7, "2")]).unwrap();
        assert_eq!(body["date"], json!("2024-05-02"));
        assert_eq!(body["batch_records"], json!([{"symptom_id": 7, "value": 2.0}]));
    }

    #[test]
    fn test_masks() {
        assert_eq!(apply_mask(DATE_MASK, "01052024"), "01/05/2024");
        assert_eq!(apply_mask(DATE_MASK, "0105"), "01/05");
        assert_eq!(apply_mask(DATE_MASK, "01/05/2024999"), "01/05/2024");
        assert_eq!(apply_mask(TIME_MASK, "8a30"), "83:0");
        assert_eq!(apply_mask(TIME_MASK, "0830"), "08:30");
        assert_eq!(apply_mask(TIME_MASK, ""), "");
    }

    #[test]
    fn test_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time = NaiveTime::from_hms_opt(8, 5, 0).unwrap();
        assert_eq!(format_default_date(date), "01/05/2024");
        assert_eq!(format_default_time(time), "08:05");
    }
}
