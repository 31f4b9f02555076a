//! Read side of the store. Everything here is a plain SELECT; the ingestion
//! run is the only writer.

use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool};

use crate::config::{INITIAL_LATITUDE, INITIAL_LONGITUDE};
use crate::db::models::{ArchiveEntry, CurrentPosition, DailySnapshot, PositionRecord, RankingEntry};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingSort {
    /// Most sightings first, older entries break ties.
    #[default]
    Count,
    /// Most recently updated first.
    Date,
}

impl RankingSort {
    fn order_by(self) -> &'static str {
        match self {
            RankingSort::Count => " ORDER BY count DESC, last_update_date ASC",
            RankingSort::Date => " ORDER BY last_update_date DESC",
        }
    }
}

/// Date of the most recent ranking update, if any entry exists.
pub async fn latest_update_date(pool: &SqlitePool) -> Result<Option<i64>> {
    let date = sqlx::query_scalar(
        "SELECT last_update_date FROM ranking_entries ORDER BY last_update_date DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(date)
}

pub async fn latest_position<'e, E>(executor: E) -> Result<Option<PositionRecord>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, PositionRecord>(
        r#"
        SELECT date, longitude_diff, longitude_trend, latitude_diff, latitude_trend, latitude, longitude
        FROM position_records
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(executor)
    .await?;
    Ok(record)
}

/// Latest position with its signed deltas; the seed point when the
/// trajectory is still empty.
pub async fn current_position(pool: &SqlitePool) -> Result<CurrentPosition> {
    let current = match latest_position(pool).await? {
        Some(record) => {
            let (latitude_delta, longitude_delta) = record.deltas();
            CurrentPosition {
                latitude: record.latitude,
                longitude: record.longitude,
                latitude_delta,
                longitude_delta,
            }
        }
        None => CurrentPosition {
            latitude: INITIAL_LATITUDE,
            longitude: INITIAL_LONGITUDE,
            latitude_delta: 0.0,
            longitude_delta: 0.0,
        },
    };
    Ok(current)
}

/// Active ranking. With `include_archived`, archived rows are merged in per
/// name: counts summed, latest update date kept.
pub async fn ranking(
    pool: &SqlitePool,
    sort: RankingSort,
    include_archived: bool,
) -> Result<Vec<RankingEntry>> {
    let base = if include_archived {
        r#"
        SELECT name, SUM(count) AS count, MAX(last_update_date) AS last_update_date
        FROM (
            SELECT name, count, last_update_date FROM ranking_entries
            UNION ALL
            SELECT name, count, last_update_date FROM archive_entries
        )
        GROUP BY name
        "#
    } else {
        "SELECT name, count, last_update_date FROM ranking_entries"
    };
    let sql = format!("{base}{}", sort.order_by());

    let rows = sqlx::query_as::<_, RankingEntry>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn archive(pool: &SqlitePool) -> Result<Vec<ArchiveEntry>> {
    let rows = sqlx::query_as::<_, ArchiveEntry>(
        "SELECT name, count, last_update_date, drop_date FROM archive_entries ORDER BY drop_date DESC, last_update_date DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn snapshots(pool: &SqlitePool) -> Result<Vec<DailySnapshot>> {
    let rows = sqlx::query_as::<_, DailySnapshot>(
        "SELECT date, name, value FROM daily_snapshots ORDER BY date DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Whole trajectory, oldest first.
pub async fn trajectory(pool: &SqlitePool) -> Result<Vec<PositionRecord>> {
    let rows = sqlx::query_as::<_, PositionRecord>(
        r#"
        SELECT date, longitude_diff, longitude_trend, latitude_diff, latitude_trend, latitude, longitude
        FROM position_records
        ORDER BY date ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn insert_entry(pool: &SqlitePool, table: &str, name: &str, count: i64, date: i64) {
        let sql = if table == "archive_entries" {
            "INSERT INTO archive_entries (name, count, last_update_date, drop_date) VALUES (?, ?, ?, 20240101)"
        } else {
            "INSERT INTO ranking_entries (name, count, last_update_date) VALUES (?, ?, ?)"
        };
        sqlx::query(sql)
            .bind(name)
            .bind(count)
            .bind(date)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn latest_update_date_on_empty_store() {
        let pool = memory_pool().await;
        assert_eq!(latest_update_date(&pool).await.unwrap(), None);

        insert_entry(&pool, "ranking_entries", "a", 1, 20240101).await;
        insert_entry(&pool, "ranking_entries", "b", 1, 20240105).await;
        assert_eq!(latest_update_date(&pool).await.unwrap(), Some(20240105));
    }

    #[tokio::test]
    async fn ranking_sorts_by_count_then_older_first() {
        let pool = memory_pool().await;
        insert_entry(&pool, "ranking_entries", "newer", 5, 20240103).await;
        insert_entry(&pool, "ranking_entries", "older", 5, 20240101).await;
        insert_entry(&pool, "ranking_entries", "top", 9, 20240102).await;

        let names: Vec<String> = ranking(&pool, RankingSort::Count, false)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["top", "older", "newer"]);

        let names: Vec<String> = ranking(&pool, RankingSort::Date, false)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["newer", "top", "older"]);
    }

    #[tokio::test]
    async fn ranking_merges_archive_when_asked() {
        let pool = memory_pool().await;
        insert_entry(&pool, "ranking_entries", "mx", 4, 20240103).await;
        insert_entry(&pool, "archive_entries", "mx", 10, 20210101).await;
        insert_entry(&pool, "archive_entries", "gone", 2, 20200101).await;

        let merged = ranking(&pool, RankingSort::Count, true).await.unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "mx");
        assert_eq!(merged[0].count, 14);
        assert_eq!(merged[0].last_update_date, 20240103);
        assert_eq!(merged[1].name, "gone");

        let active = ranking(&pool, RankingSort::Count, false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].count, 4);
    }

    #[tokio::test]
    async fn current_position_defaults_to_seed() {
        let pool = memory_pool().await;
        let current = current_position(&pool).await.unwrap();
        assert_eq!(
            current,
            CurrentPosition {
                latitude: 60.0,
                longitude: 30.0,
                latitude_delta: 0.0,
                longitude_delta: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn current_position_uses_latest_record() {
        let pool = memory_pool().await;
        for (date, lat, lon) in [(20240101_i64, 61.0, 31.0), (20240102_i64, 60.9888, 30.5187)] {
            sqlx::query(
                "INSERT INTO position_records (date, longitude_diff, longitude_trend, latitude_diff, latitude_trend, latitude, longitude) VALUES (?, 0.0839, -1, 0.0828, 1, ?, ?)",
            )
            .bind(date)
            .bind(lat)
            .bind(lon)
            .execute(&pool)
            .await
            .unwrap();
        }

        let current = current_position(&pool).await.unwrap();
        assert_eq!((current.latitude, current.longitude), (60.9888, 30.5187));
        assert_eq!((current.latitude_delta, current.longitude_delta), (0.0828, -0.0839));

        let records = trajectory(&pool).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, 20240101);
    }
}
