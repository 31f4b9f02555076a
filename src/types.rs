use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Page model
// ---------------------------------------------------------------------------

/// Movement of a row's value relative to the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Parse the `alt` text of the trend image: `>` up, `<` down, `=` flat.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim() {
            ">" => Some(Trend::Up),
            "<" => Some(Trend::Down),
            "=" => Some(Trend::Flat),
            _ => None,
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            Trend::Up => 1,
            Trend::Down => -1,
            Trend::Flat => 0,
        }
    }
}

/// One row of the ranking table, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub item_id: String,
    pub item_url: String,
    pub value: u32,
    pub trend: Trend,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The pivot row of one fetch plus the (value, trend) pairs of the two rows
/// that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub pivot_item_id: String,
    pub pivot_item_url: String,
    pub pivot_value: u32,
    pub next1_value: u32,
    pub next1_trend: Trend,
    pub next2_value: u32,
    pub next2_trend: Trend,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Encode a calendar date as the integer YYYYMMDD used for every date column.
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Today's local date as YYYYMMDD.
pub fn today_key() -> i64 {
    date_key(chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_symbols() {
        assert_eq!(Trend::from_symbol(">"), Some(Trend::Up));
        assert_eq!(Trend::from_symbol("<"), Some(Trend::Down));
        assert_eq!(Trend::from_symbol(" = "), Some(Trend::Flat));
        assert_eq!(Trend::from_symbol("~"), None);
        assert_eq!(Trend::from_symbol(""), None);
    }

    #[test]
    fn trend_signs() {
        assert_eq!(Trend::Up.sign(), 1);
        assert_eq!(Trend::Down.sign(), -1);
        assert_eq!(Trend::Flat.sign(), 0);
    }

    #[test]
    fn date_key_is_yyyymmdd() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(date_key(d), 20240102);
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(date_key(d), 19991231);
    }
}
