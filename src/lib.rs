pub mod aggregator;
pub mod api;
pub mod database;
pub mod error;
pub mod loader;
pub mod merger;
pub mod models;
pub mod utils;
