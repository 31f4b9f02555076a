//! Row types for the four tables. Column names are what the API serves.
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RankingEntry {
    pub name: String,
    pub count: i64,
    pub last_update_date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailySnapshot {
    pub date: i64,
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArchiveEntry {
    pub name: String,
    pub count: i64,
    pub last_update_date: i64,
    pub drop_date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PositionRecord {
    pub date: i64,
    pub longitude_diff: Option<f64>,
    pub longitude_trend: Option<i64>,
    pub latitude_diff: Option<f64>,
    pub latitude_trend: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionRecord {
    /// Signed movement that produced this record, (latitude, longitude).
    pub fn deltas(&self) -> (f64, f64) {
        let signed = |diff: Option<f64>, trend: Option<i64>| {
            diff.unwrap_or(0.0) * trend.unwrap_or(0) as f64
        };
        (
            signed(self.latitude_diff, self.latitude_trend),
            signed(self.longitude_diff, self.longitude_trend),
        )
    }
}

/// Current point of the trajectory plus the vector that led to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}
