pub mod app;
pub mod config;
pub mod json_store;
