use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::GlobalConfig;
use crate::git::worker::CommandExecutor;
use crate::git::SyncEngine;
use crate::paths::SyncPaths;
use crate::scheduler::{SyncScheduler, TriggerOutcome};

pub async fn run_standalone() -> Result<()> {
    let global = GlobalConfig::load();
    let paths = SyncPaths::resolve(&global)?;
    run_standalone_with_paths(paths, global).await
}

async fn run_standalone_with_paths(paths: SyncPaths, global: GlobalConfig) -> Result<()> {
    let engine = Arc::new(SyncEngine::new(paths.clone(), &global));
    let init_engine = Arc::clone(&engine);
    tokio::task::spawn_blocking(move || init_engine.ensure_init())
        .await
        .context("initialization task failed")?
        .context("failed to initialize sync repository")?;

    let scheduler = SyncScheduler::new(engine, &global.scheduler);
    let tick = global.scheduler.tick_interval();
    info!(repo = %paths.repo_root.display(), ?tick, "standalone sync daemon started");

    run_until_shutdown(&scheduler, tick, shutdown_signal()).await;
    info!("standalone sync daemon stopped");
    Ok(())
}

/// Trigger a sync on every tick until `shutdown` resolves. A cycle in
/// progress always runs to completion.
pub async fn run_until_shutdown<E, F>(scheduler: &SyncScheduler<E>, tick: Duration, shutdown: F)
where
    E: CommandExecutor + 'static,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => match scheduler.trigger(false).await {
                TriggerOutcome::Ran(result) => {
                    debug!(success = result.success, "scheduled sync finished");
                }
                skipped => debug!(?skipped, "scheduled sync skipped"),
            },
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
