use tracing::error;

use distrowatch_drift::config::Config;
use distrowatch_drift::error::Result;
use distrowatch_drift::ingest::{self, RunContext};
use distrowatch_drift::logging;
use distrowatch_drift::types::today_key;

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

    if let Err(e) = run(cfg).await {
        error!(stage = e.stage(), "Run failed at {} stage: {e}", e.stage());
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let ctx = RunContext::open(cfg).await?;
    ingest::run(&ctx, today_key()).await?;
    ctx.pool.close().await;
    Ok(())
}
