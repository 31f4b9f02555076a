use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const BASE_URL: &str = "https://distrowatch.com/";

/// Opera 54 on Linux. The site serves a reduced table to unknown agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/67.0.3396.87 Safari/537.36 OPR/54.0.2952.46";

/// Seed position used when the trajectory is empty.
pub const INITIAL_LATITUDE: f64 = 60.0;
pub const INITIAL_LONGITUDE: f64 = 30.0;

/// Scale applied to a row's value before it moves the position.
/// 10000 keeps a single day's movement well under one degree.
pub const DIVIDER: f64 = 10_000.0;

/// One year in YYYYMMDD integer arithmetic. Not calendar-accurate.
pub const RETENTION_SPAN: i64 = 10_000;

/// Decimal places kept for diffs and coordinates in `position_records`.
pub const STORED_PRECISION: i32 = 4;

/// Number of rows the ranking table normally shows.
pub const EXPECTED_ROWS: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub log_level: String,
    /// Working directory for the database and screenshots (DATA_DIR)
    pub data_dir: PathBuf,
    /// SQLite file (DB_PATH, falls back to DISTRS_DATABASE, then DATA_DIR/db.sqlite3)
    pub db_path: PathBuf,
    /// Row count the ranking table is expected to have (EXPECTED_ROWS)
    pub expected_rows: usize,
    /// Download the pivot item's screenshot after a successful run (FETCH_SCREENSHOT)
    pub fetch_screenshot: bool,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };
        let db_path = std::env::var("DB_PATH")
            .or_else(|_| std::env::var("DISTRS_DATABASE"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("db.sqlite3"));

        Ok(Self {
            base_url: std::env::var("BASE_URL").unwrap_or_else(|_| BASE_URL.to_string()),
            user_agent: std::env::var("USER_AGENT").unwrap_or_else(|_| USER_AGENT.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("HTTP_TIMEOUT_SECS must be a whole number of seconds".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_dir,
            db_path,
            expected_rows: std::env::var("EXPECTED_ROWS")
                .unwrap_or_else(|_| EXPECTED_ROWS.to_string())
                .parse::<usize>()
                .map_err(|_| AppError::Config("EXPECTED_ROWS must be a positive integer".to_string()))?,
            fetch_screenshot: parse_bool(
                "FETCH_SCREENSHOT",
                &std::env::var("FETCH_SCREENSHOT").unwrap_or_else(|_| "true".to_string()),
            )?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        })
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join("Images").join("distrs")
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("{name} must be a boolean, got {other:?}"))),
    }
}
