mod config;
mod driver;

use tracing::info;

use w2k_exec::local::LocalEngine;
use w2k_observe::{LoggerTimeZone, init_local_offset, init_logger};

use crate::config::DriverConfig;

fn main() -> anyhow::Result<()> {
    let cfg = DriverConfig::load()?;

    // Offset detection needs a single-threaded process.
    if cfg.logger.tz == LoggerTimeZone::Local {
        init_local_offset();
    }
    init_logger(&cfg.logger)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cfg))
}

async fn run(cfg: DriverConfig) -> anyhow::Result<()> {
    let engine = LocalEngine::open(&cfg.engine_root).await?;
    info!(root = %engine.root().display(), "engine ready");

    let summary = driver::run(&engine, &cfg).await?;
    info!(submitted = summary.submitted.len(), "done");
    Ok(())
}
