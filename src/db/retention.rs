use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, error, info};

use crate::config::RETENTION_SPAN;
use crate::db::models::PositionRecord;
use crate::db::queries;
use crate::drift::{self, DriftStep};
use crate::error::{AppError, Result};
use crate::types::{Outcome, Position};

/// What one successful `apply` wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Ranking entries moved to the archive by this run.
    pub archived: u64,
    pub position: PositionRecord,
}

/// Fold one day's outcome into the store as a single transaction:
/// bump the pivot's count, record the daily snapshot, archive entries that
/// fell out of the retention window and append the next drift position.
///
/// Any failure rolls the whole transaction back. A second call for the same
/// `today` fails on the snapshot's unique date.
pub async fn apply(pool: &SqlitePool, today: i64, outcome: &Outcome) -> Result<Applied> {
    let mut tx = pool.begin().await?;

    match apply_steps(&mut tx, today, outcome).await {
        Ok(applied) => {
            tx.commit().await?;
            Ok(applied)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                error!("Rollback after failed apply also failed: {rb}");
            }
            Err(e)
        }
    }
}

async fn apply_steps(
    tx: &mut Transaction<'_, Sqlite>,
    today: i64,
    outcome: &Outcome,
) -> Result<Applied> {
    let name = outcome.pivot_item_id.as_str();

    sqlx::query(
        "INSERT OR IGNORE INTO ranking_entries (name, count, last_update_date) VALUES (?, 0, ?)",
    )
    .bind(name)
    .bind(today)
    .execute(&mut **tx)
    .await?;

    let updated = sqlx::query(
        "UPDATE ranking_entries SET count = count + 1, last_update_date = ? WHERE name = ?",
    )
    .bind(today)
    .bind(name)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    if updated != 1 {
        return Err(AppError::Persist(format!(
            "{name} was not counted: another entry already holds date {today}"
        )));
    }

    sqlx::query("INSERT INTO daily_snapshots (date, name, value) VALUES (?, ?, ?)")
        .bind(today)
        .bind(name)
        .bind(i64::from(outcome.pivot_value))
        .execute(&mut **tx)
        .await?;

    let archived = archive_stale(tx, today).await?;

    let previous = queries::latest_position(&mut **tx).await?;
    let step = match previous {
        Some(p) => drift::update(
            Position {
                latitude: p.latitude,
                longitude: p.longitude,
            },
            outcome,
        ),
        None => DriftStep::seed(),
    }
    .rounded();

    let position = PositionRecord {
        date: today,
        longitude_diff: Some(step.longitude_diff),
        longitude_trend: Some(step.longitude_trend),
        latitude_diff: Some(step.latitude_diff),
        latitude_trend: Some(step.latitude_trend),
        latitude: step.position.latitude,
        longitude: step.position.longitude,
    };

    sqlx::query(
        r#"
        INSERT INTO position_records (
            date, longitude_diff, longitude_trend, latitude_diff, latitude_trend, latitude, longitude
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(position.date)
    .bind(position.longitude_diff)
    .bind(position.longitude_trend)
    .bind(position.latitude_diff)
    .bind(position.latitude_trend)
    .bind(position.latitude)
    .bind(position.longitude)
    .execute(&mut **tx)
    .await?;

    debug!(
        date = today,
        latitude = position.latitude,
        longitude = position.longitude,
        "position appended"
    );

    Ok(Applied { archived, position })
}

/// Move entries not updated within the retention window into the archive.
/// The cutoff is plain integer subtraction on YYYYMMDD.
async fn archive_stale(tx: &mut Transaction<'_, Sqlite>, today: i64) -> Result<u64> {
    let cutoff = today - RETENTION_SPAN;

    sqlx::query(
        r#"
        INSERT INTO archive_entries (name, count, last_update_date, drop_date)
        SELECT name, count, last_update_date, ? FROM ranking_entries WHERE last_update_date < ?
        "#,
    )
    .bind(today)
    .bind(cutoff)
    .execute(&mut **tx)
    .await?;

    let archived = sqlx::query("DELETE FROM ranking_entries WHERE last_update_date < ?")
        .bind(cutoff)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if archived > 0 {
        info!(cutoff, archived, "Archived stale ranking entries");
    }
    Ok(archived)
}
