//! API models
//!
//! Payloads exchanged with the symptom-tracking backend. Dates travel as
//! `yyyy-mm-dd` strings and times as `HH:MM`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

/// Daily aggregate of one symptom, as returned by `/get-records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: i64,
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub symptom_id: i64,
    pub symptom_name: String,
    pub average_value: f64,
    #[serde(default)]
    pub total_value: f64,
}

/// A single logged value, as returned by `/get-records-by-symptom/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub symptom_id: i64,
    pub symptom_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub description: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One entry of a symptom reordering request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomOrder {
    pub id: String,
    pub order: String,
}

/// One value of a batch insert: the same date/time for several symptoms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchValue {
    pub symptom_id: i64,
    pub value: f64,
}
