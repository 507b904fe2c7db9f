use anyhow::{anyhow, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::time::Instant;
use tracing::{debug, info};

use crate::api::{DailyRecord, Event, Symptom, SymptomOrder, SymptomRecord};
use crate::api_client::{ApiClient, ApiError};
use crate::config::config::Config;
use crate::data::list_table::{
    ListGrid, ListOptions, ListTable, MoveDirection, RowAction, RowAttribute,
};
use crate::data::records_builder::{
    build_events_list, build_records_pivot, build_symptom_records_list, build_symptoms_list,
};
use crate::data::records_table::RecordsTable;

/// Read side of the backend, as far as the tables need it
pub trait SymptomSource {
    fn get_symptoms(&self) -> Result<Vec<Symptom>, ApiError>;
    fn get_records(&self) -> Result<Vec<DailyRecord>, ApiError>;
    fn get_records_by_symptom(&self, symptom_id: i64) -> Result<Vec<SymptomRecord>, ApiError>;
    fn get_events(&self) -> Result<Vec<Event>, ApiError>;
}

impl SymptomSource for ApiClient {
    fn get_symptoms(&self) -> Result<Vec<Symptom>, ApiError> {
        ApiClient::get_symptoms(self)
    }

    fn get_records(&self) -> Result<Vec<DailyRecord>, ApiError> {
        ApiClient::get_records(self)
    }

    fn get_records_by_symptom(&self, symptom_id: i64) -> Result<Vec<SymptomRecord>, ApiError> {
        ApiClient::get_records_by_symptom(self, symptom_id)
    }

    fn get_events(&self) -> Result<Vec<Event>, ApiError> {
        ApiClient::get_events(self)
    }
}

/// Service responsible for turning backend data into loaded tables
pub struct DataLoaderService<'a, S: SymptomSource> {
    source: &'a S,
    config: &'a Config,
}

impl<'a, S: SymptomSource> DataLoaderService<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Pivoted history, opened on the page with the most recent dates
    pub fn load_history(&self) -> Result<RecordsTable> {
        let start = Instant::now();
        let symptoms = self.source.get_symptoms()?;
        let records = self.source.get_records()?;

        let pivot = build_records_pivot(&symptoms, &records);
        let page = pivot.last_page(self.config.records.columns_per_page);

        let mut table = RecordsTable::new(self.config.view_state(), self.config.table_options());
        table.load_data(pivot.rows, pivot.columns, page);

        info!(
            "Loaded history: {} symptoms, {} records, {} dates in {:?}",
            symptoms.len(),
            records.len(),
            pivot.distinct_dates,
            start.elapsed()
        );
        Ok(table)
    }

    pub fn load_events(&self) -> Result<ListTable> {
        let events = self.source.get_events()?;
        let (rows, columns) = build_events_list(&events);

        let mut table = ListTable::new(ListOptions {
            actions: vec![RowAction::Edit, RowAction::Delete],
            row_attributes: vec![
                RowAttribute::new("id", "id"),
                RowAttribute::new("raw_date", "raw_date"),
                RowAttribute::new("time", "time"),
                RowAttribute::new("description", "description"),
            ],
            ..self.config.events_list_options()
        });
        table.load_data(rows, columns);
        info!("Loaded {} events", events.len());
        Ok(table)
    }

    pub fn load_symptoms(&self) -> Result<ListTable> {
        let symptoms = self.source.get_symptoms()?;
        let (rows, columns) = build_symptoms_list(&symptoms);

        let mut table = ListTable::new(ListOptions {
            page_size: 50,
            actions: vec![RowAction::Edit, RowAction::Delete],
            row_attributes: vec![
                RowAttribute::new("id", "id"),
                RowAttribute::new("order", "order"),
            ],
            ..ListOptions::default()
        });
        table.load_data(rows, columns);
        info!("Loaded {} symptoms", symptoms.len());
        Ok(table)
    }

    pub fn load_symptom_records(&self, symptom: &Symptom) -> Result<ListTable> {
        let records = self.source.get_records_by_symptom(symptom.id)?;
        let (rows, columns) = build_symptom_records_list(&records);

        let mut table = ListTable::new(ListOptions {
            actions: vec![RowAction::Edit, RowAction::Delete, RowAction::DeleteDate],
            row_attributes: vec![
                RowAttribute::new("id", "id"),
                RowAttribute::new("raw_date", "raw_date"),
            ],
            ..self.config.events_list_options()
        });
        table.load_data(rows, columns);
        info!("Loaded {} records for symptom {}", records.len(), symptom.name);
        Ok(table)
    }

    /// Find a symptom by id or by (fuzzy) name
    pub fn resolve_symptom(&self, query: &str) -> Result<Symptom> {
        let symptoms = self.source.get_symptoms()?;
        find_symptom(&symptoms, query)
            .cloned()
            .ok_or_else(|| anyhow!("Sintoma não encontrado: {}", query))
    }
}

/// Exact id, then case-insensitive name, then best fuzzy match
pub fn find_symptom<'s>(symptoms: &'s [Symptom], query: &str) -> Option<&'s Symptom> {
    let query = query.trim();
    if let Ok(id) = query.parse::<i64>() {
        return symptoms.iter().find(|s| s.id == id);
    }
    if let Some(exact) = symptoms.iter().find(|s| s.name.eq_ignore_ascii_case(query)) {
        return Some(exact);
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let best = symptoms
        .iter()
        .filter_map(|s| matcher.fuzzy_match(&s.name, query).map(|score| (score, s)))
        .max_by_key(|(score, _)| *score);
    if let Some((score, symptom)) = best {
        debug!("Fuzzy matched '{}' to '{}' (score {})", query, symptom.name, score);
    }
    best.map(|(_, s)| s)
}

/// New symptom order after moving the 1-based `row` of a symptoms page one
/// step up or down.
///
/// The rows keep the order values they already had, handed out again in
/// the new sequence, so rows on other pages are unaffected. `None` when
/// the row does not exist or is already at that edge of the page.
pub fn reorder_symptoms(
    grid: &ListGrid,
    row: usize,
    direction: MoveDirection,
) -> Option<Vec<SymptomOrder>> {
    let mut entries: Vec<(String, String)> = grid
        .rows
        .iter()
        .filter(|r| r.source_index.is_some())
        .map(|r| {
            Some((
                r.attribute("id")?.to_string(),
                r.attribute("order")?.to_string(),
            ))
        })
        .collect::<Option<_>>()?;

    let from = row.checked_sub(1).filter(|idx| *idx < entries.len())?;
    let to = match direction {
        MoveDirection::Up => from.checked_sub(1)?,
        MoveDirection::Down => Some(from + 1).filter(|idx| *idx < entries.len())?,
    };

    let mut slots: Vec<String> = entries.iter().map(|(_, order)| order.clone()).collect();
    slots.sort_by(|a, b| {
        let (x, y) = (a.parse::<f64>().unwrap_or(0.0), b.parse::<f64>().unwrap_or(0.0));
        x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.swap(from, to);
    debug!("Moving symptom row {} to {}", from + 1, to + 1);

    Some(
        entries
            .into_iter()
            .zip(slots)
            .map(|((id, _), order)| SymptomOrder { id, order })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        symptoms: Vec<Symptom>,
        records: Vec<DailyRecord>,
        events: Vec<Event>,
    }

    impl SymptomSource for StaticSource {
        fn get_symptoms(&self) -> Result<Vec<Symptom>, ApiError> {
            Ok(self.symptoms.clone())
        }

        fn get_records(&self) -> Result<Vec<DailyRecord>, ApiError> {
            Ok(self.records.clone())
        }

        fn get_records_by_symptom(&self, _symptom_id: i64) -> Result<Vec<SymptomRecord>, ApiError> {
            Err(ApiError::Unauthorized)
        }

        fn get_events(&self) -> Result<Vec<Event>, ApiError> {
            Ok(self.events.clone())
        }
    }

    fn source() -> StaticSource {
        let symptoms = vec![
            Symptom {
                id: 1,
                name: "dor de cabeça".to_string(),
                order: 1,
            },
            Symptom {
                id: 2,
                name: "fadiga".to_string(),
                order: 2,
            },
        ];
        let records = (1..=20)
            .map(|day| DailyRecord {
                id: day,
                date: format!("2024-05-{:02}", day),
                time: "08:00".to_string(),
                symptom_id: 1,
                symptom_name: "dor de cabeça".to_string(),
                average_value: 2.0,
                total_value: 2.0,
            })
            .collect();
        let events = vec![Event {
            id: 9,
            description: "Café".to_string(),
            date: "2024-05-03".to_string(),
            time: "07:30".to_string(),
        }];
        StaticSource {
            symptoms,
            records,
            events,
        }
    }

    #[test]
    fn test_history_opens_on_last_page() {
        let source = source();
        let config = Config::default();
        let service = DataLoaderService::new(&source, &config);
        let table = service.load_history().unwrap();
        // 20 dates, 14 per page
        assert_eq!(table.view().current_page, 2);
        assert_eq!(table.pagination().total_pages, 2);
        let grid = table.last_render().unwrap();
        assert_eq!(grid.header_labels()[1], "15/05");
    }

    #[test]
    fn test_events_list() {
        let source = source();
        let config = Config::default();
        let table = DataLoaderService::new(&source, &config).load_events().unwrap();
        let grid = table.last_render().unwrap();
        assert_eq!(grid.rows[0].cells, vec!["03/05/2024", "Café [07:30h]"]);
        assert_eq!(grid.rows[0].attribute("raw_date"), Some("2024-05-03"));
        assert_eq!(table.page_size(), 25);
    }

    #[test]
    fn test_errors_propagate() {
        let source = source();
        let config = Config::default();
        let service = DataLoaderService::new(&source, &config);
        let symptom = service.resolve_symptom("1").unwrap();
        assert!(service.load_symptom_records(&symptom).is_err());
    }

    #[test]
    fn test_reorder_symptoms() {
        let mut source = source();
        source.symptoms.push(Symptom {
            id: 7,
            name: "insônia".to_string(),
            order: 5,
        });
        let config = Config::default();
        let table = DataLoaderService::new(&source, &config).load_symptoms().unwrap();
        let grid = table.last_render().unwrap();

        let order = reorder_symptoms(grid, 3, MoveDirection::Up).unwrap();
        let pairs: Vec<(&str, &str)> = order
            .iter()
            .map(|o| (o.id.as_str(), o.order.as_str()))
            .collect();
        assert_eq!(pairs, vec![("1", "1"), ("7", "2"), ("2", "5")]);

        let order = reorder_symptoms(grid, 1, MoveDirection::Down).unwrap();
        assert_eq!(order[0].id, "2");
        assert_eq!(order[0].order, "1");

        assert!(reorder_symptoms(grid, 1, MoveDirection::Up).is_none());
        assert!(reorder_symptoms(grid, 3, MoveDirection::Down).is_none());
        assert!(reorder_symptoms(grid, 0, MoveDirection::Down).is_none());
        assert!(reorder_symptoms(grid, 9, MoveDirection::Up).is_none());
    }

    #[test]
    fn test_find_symptom() {
        let symptoms = source().symptoms;
        assert_eq!(find_symptom(&symptoms, "2").map(|s| s.id), Some(2));
        assert_eq!(find_symptom(&symptoms, "FADIGA").map(|s| s.id), Some(2));
        assert_eq!(find_symptom(&symptoms, "dcab").map(|s| s.id), Some(1));
        assert!(find_symptom(&symptoms, "99").is_none());
    }
}
