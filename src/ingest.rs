use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{self, queries, retention};
use crate::detector;
use crate::error::Result;
use crate::fetcher;
use crate::parser;
use crate::types::Outcome;

/// Everything one ingestion run needs, passed explicitly.
pub struct RunContext {
    pub cfg: Config,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

impl RunContext {
    /// Create the data directory if missing, open the database and build the
    /// HTTP client.
    pub async fn open(cfg: Config) -> Result<Self> {
        tokio::fs::create_dir_all(&cfg.data_dir).await?;
        let pool = db::open(&cfg.db_path).await?;
        info!("Database ready at {}", cfg.db_path.display());
        let client = fetcher::client(&cfg)?;
        Ok(Self { cfg, pool, client })
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The ranking already carries today's date; nothing was fetched.
    AlreadyProcessed,
    Applied {
        outcome: Outcome,
        applied: retention::Applied,
    },
}

/// One daily run: skip if today is done, otherwise fetch the ranking page,
/// fold it into the store and grab the pivot's screenshot.
pub async fn run(ctx: &RunContext, today: i64) -> Result<RunOutcome> {
    if queries::latest_update_date(&ctx.pool).await? == Some(today) {
        info!("Database is already updated today ({today})");
        return Ok(RunOutcome::AlreadyProcessed);
    }

    let html = fetcher::fetch_page(&ctx.client, &ctx.cfg.base_url).await?;
    let result = ingest_page(&ctx.pool, &ctx.cfg, today, &html).await?;

    if ctx.cfg.fetch_screenshot {
        if let RunOutcome::Applied { outcome, .. } = &result {
            // The day is committed at this point; a missing screenshot is not fatal.
            match fetcher::download_screenshot(
                &ctx.client,
                &ctx.cfg.base_url,
                &outcome.pivot_item_url,
                &ctx.cfg.data_dir,
            )
            .await
            {
                Ok(path) => info!("Screenshot saved to {}", path.display()),
                Err(e) => warn!("Screenshot for {} not saved: {e}", outcome.pivot_item_id),
            }
        }
    }

    Ok(result)
}

/// Parse an already fetched ranking page and apply it for `today`.
pub async fn ingest_page(
    pool: &SqlitePool,
    cfg: &Config,
    today: i64,
    html: &str,
) -> Result<RunOutcome> {
    let rows = parser::parse_rows(html, &cfg.base_url)?;
    if rows.len() != cfg.expected_rows {
        warn!(
            "Ranking table has {} rows instead of {}",
            rows.len(),
            cfg.expected_rows
        );
    }

    let outcome = detector::extract(&rows)?;
    let applied = retention::apply(pool, today, &outcome).await?;

    info!(
        date = today,
        pivot = %outcome.pivot_item_id,
        value = outcome.pivot_value,
        latitude = applied.position.latitude,
        longitude = applied.position.longitude,
        archived = applied.archived,
        "Updated {today}: {} ({} hpd) -> {:.4}, {:.4}",
        outcome.pivot_item_id,
        outcome.pivot_value,
        applied.position.latitude,
        applied.position.longitude,
    );

    Ok(RunOutcome::Applied { outcome, applied })
}
