use crate::config::{DIVIDER, INITIAL_LATITUDE, INITIAL_LONGITUDE, STORED_PRECISION};
use crate::types::{Outcome, Position};

/// One day's movement of the synthetic position.
///
/// Longitude is driven by the first row after the pivot, latitude by the
/// second. Diffs are unsigned magnitudes; trends carry the direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftStep {
    pub position: Position,
    pub longitude_diff: f64,
    pub longitude_trend: i64,
    pub latitude_diff: f64,
    pub latitude_trend: i64,
}

impl DriftStep {
    /// The fixed first point of an empty trajectory.
    pub fn seed() -> Self {
        Self {
            position: Position {
                latitude: INITIAL_LATITUDE,
                longitude: INITIAL_LONGITUDE,
            },
            longitude_diff: 0.0,
            longitude_trend: 0,
            latitude_diff: 0.0,
            latitude_trend: 0,
        }
    }

    /// Round diffs and coordinates to the precision kept in storage.
    pub fn rounded(self) -> Self {
        Self {
            position: Position {
                latitude: round_stored(self.position.latitude),
                longitude: round_stored(self.position.longitude),
            },
            longitude_diff: round_stored(self.longitude_diff),
            latitude_diff: round_stored(self.latitude_diff),
            ..self
        }
    }
}

/// Move `prev` by the outcome's follower rows and wrap past the upper bounds.
pub fn update(prev: Position, outcome: &Outcome) -> DriftStep {
    let longitude_diff = f64::from(outcome.next1_value) / DIVIDER;
    let longitude_trend = outcome.next1_trend.sign();
    let latitude_diff = f64::from(outcome.next2_value) / DIVIDER;
    let latitude_trend = outcome.next2_trend.sign();

    let longitude = prev.longitude + longitude_diff * longitude_trend as f64;
    let latitude = prev.latitude + latitude_diff * latitude_trend as f64;

    DriftStep {
        position: Position {
            latitude: wrap_latitude(latitude),
            longitude: wrap_longitude(longitude),
        },
        longitude_diff,
        longitude_trend,
        latitude_diff,
        latitude_trend,
    }
}

// Upper bound only; a single day never overshoots by a full period.
fn wrap_latitude(latitude: f64) -> f64 {
    if latitude > 90.0 {
        latitude - 180.0
    } else {
        latitude
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

fn round_stored(x: f64) -> f64 {
    let scale = 10f64.powi(STORED_PRECISION);
    (x * scale).round() / scale
}
