pub mod api;
pub mod api_client;
pub mod commands;
pub mod config;
pub mod data;
pub mod form_validator;
pub mod search_filter;
pub mod services;
pub mod state;
pub mod table_display;
pub mod utils;
