use std::path::PathBuf;
use std::time::Instant;

use axum::{
    extract::{Query, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::{ArchiveEntry, CurrentPosition, DailySnapshot, PositionRecord, RankingEntry};
use crate::db::queries::{self, RankingSort};
use crate::error::AppError;
use crate::screenshot;

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    /// Directory the ingestion run saves screenshots into.
    pub data_dir: PathBuf,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/ranking", get(get_ranking))
        .route("/archive", get(get_archive))
        .route("/snapshots", get(get_snapshots))
        .route("/positions", get(get_positions))
        .route("/positions/current", get(get_current_position))
        .route("/average-color", get(get_average_color))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let resp = next.run(req).await;

    info!(
        %method,
        %uri,
        status = resp.status().as_u16(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "{method} {uri} {}",
        resp.status()
    );
    resp
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RankingQuery {
    /// `count` (default) or `date`; anything else is rejected with 400.
    pub sort: Option<RankingSort>,
    /// Merge archived entries into the ranking.
    pub archived: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_ranking(
    State(state): State<ApiState>,
    Query(params): Query<RankingQuery>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let sort = params.sort.unwrap_or_default();
    let include_archived = params.archived.unwrap_or(false);
    let entries = queries::ranking(&state.pool, sort, include_archived).await?;
    Ok(Json(entries))
}

async fn get_archive(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ArchiveEntry>>, AppError> {
    Ok(Json(queries::archive(&state.pool).await?))
}

async fn get_snapshots(
    State(state): State<ApiState>,
) -> Result<Json<Vec<DailySnapshot>>, AppError> {
    Ok(Json(queries::snapshots(&state.pool).await?))
}

async fn get_positions(
    State(state): State<ApiState>,
) -> Result<Json<Vec<PositionRecord>>, AppError> {
    Ok(Json(queries::trajectory(&state.pool).await?))
}

async fn get_current_position(
    State(state): State<ApiState>,
) -> Result<Json<CurrentPosition>, AppError> {
    Ok(Json(queries::current_position(&state.pool).await?))
}

async fn get_average_color(State(state): State<ApiState>) -> Result<Json<String>, AppError> {
    let dir = state.data_dir.clone();
    let color = tokio::task::spawn_blocking(move || screenshot::latest_average_color(&dir))
        .await
        .map_err(|e| AppError::Image(format!("average colour task failed: {e}")))??;
    Ok(Json(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::memory_pool;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn seeded_app() -> Router {
        app_with_dir(std::env::temp_dir()).await
    }

    async fn app_with_dir(data_dir: PathBuf) -> Router {
        let pool = memory_pool().await;
        for (name, count, date) in [("mx", 5_i64, 20240101_i64), ("mint", 9, 20240102)] {
            sqlx::query("INSERT INTO ranking_entries (name, count, last_update_date) VALUES (?, ?, ?)")
                .bind(name)
                .bind(count)
                .bind(date)
                .execute(&pool)
                .await
                .unwrap();
        }
        router(ApiState { pool, data_dir })
    }

    #[tokio::test]
    async fn status_reports_version() {
        let (status, body) = get_json(seeded_app().await, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn ranking_is_sorted_by_count_by_default() {
        let (status, body) = get_json(seeded_app().await, "/ranking").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "mint");
        assert_eq!(body[0]["count"], 9);
        assert_eq!(body[1]["name"], "mx");
        assert_eq!(body[1]["last_update_date"], 20240101);
    }

    #[tokio::test]
    async fn ranking_by_date() {
        let (status, body) = get_json(seeded_app().await, "/ranking?sort=date").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "mint");
    }

    #[tokio::test]
    async fn unknown_sort_is_bad_request() {
        let (status, _) = get_json(seeded_app().await, "/ranking?sort=name").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn current_position_on_empty_trajectory() {
        let (status, body) = get_json(seeded_app().await, "/positions/current").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["latitude"], 60.0);
        assert_eq!(body["longitude"], 30.0);
        assert_eq!(body["latitude_delta"], 0.0);
    }

    #[tokio::test]
    async fn empty_tables_serve_empty_lists() {
        let app = seeded_app().await;
        for uri in ["/archive", "/snapshots", "/positions"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, serde_json::json!([]), "{uri}");
        }
    }

    #[tokio::test]
    async fn average_color_of_newest_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([0x12, 0x34, 0x56, 0xff]));
        img.save(dir.path().join("mx.png")).unwrap();

        let (status, body) = get_json(app_with_dir(dir.path().to_path_buf()).await, "/average-color").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "#123456");
    }

    #[tokio::test]
    async fn average_color_without_images_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.sqlite3"), "").unwrap();

        let (status, body) = get_json(app_with_dir(dir.path().to_path_buf()).await, "/average-color").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("could not find images in directory"), "{message}");
    }
}
