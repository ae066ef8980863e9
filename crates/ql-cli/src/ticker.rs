//! Periodic background work while serving: metric fluctuation and the
//! rotating status line.

use std::sync::Arc;

use ql_core::Engine;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Run both timers until `token` is cancelled. Missed ticks are skipped, not
/// replayed, so a long tool call never causes a burst of updates.
pub fn spawn(
    engine: Arc<Mutex<Engine>>,
    status: Arc<RwLock<String>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (metrics_every, status_every) = {
            let engine = engine.lock().await;
            (
                engine.config().metrics_interval(),
                engine.config().status_interval(),
            )
        };
        let mut metrics_tick = interval(metrics_every);
        metrics_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut status_tick = interval(status_every);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            metrics_secs = metrics_every.as_secs(),
            status_secs = status_every.as_secs(),
            "ticker started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = metrics_tick.tick() => {
                    engine.lock().await.update_metrics();
                }
                _ = status_tick.tick() => {
                    let line = engine.lock().await.status_line();
                    *status.write().await = line;
                }
            }
        }

        tracing::info!("ticker stopped");
    })
}
