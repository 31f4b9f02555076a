pub mod api;
pub mod config;
pub mod db;
pub mod detector;
pub mod drift;
pub mod error;
pub mod fetcher;
pub mod ingest;
pub mod logging;
pub mod parser;
pub mod screenshot;
pub mod types;
