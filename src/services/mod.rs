pub mod data_loader_service;

pub use data_loader_service::{find_symptom, reorder_symptoms, DataLoaderService, SymptomSource};
