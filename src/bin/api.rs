use tracing::{error, info};

use distrowatch_drift::api::routes::{router, ApiState};
use distrowatch_drift::config::Config;
use distrowatch_drift::db;
use distrowatch_drift::error::Result;
use distrowatch_drift::logging;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&cfg.log_level);

    if let Err(e) = serve(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let pool = db::open_read_only(&cfg.db_path).await?;
    info!("Serving {} read-only", cfg.db_path.display());

    let app = router(ApiState {
        pool,
        data_dir: cfg.data_dir.clone(),
    });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
