//! Periodic evaluation and graceful shutdown.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::app::cycle::Evaluator;

/// Call `cycle` every `interval` until `token` is cancelled.
///
/// The first call happens immediately. A cycle that overruns delays the next
/// one instead of bunching calls up.
pub async fn run_periodically<F, Fut>(interval: Duration, token: CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = cycle() => {}
        }
    }
}

/// Run the evaluator every `interval` until SIGINT or SIGTERM.
pub async fn run(evaluator: Evaluator, interval: Duration) {
    let token = CancellationToken::new();
    let signal_task = tokio::spawn(cancel_on_signal(token.clone()));

    tracing::info!(interval = ?interval, "starting UPS evaluation loop");
    let evaluator = &evaluator;
    run_periodically(interval, token, move || async move {
        if let Err(e) = evaluator.run_cycle().await {
            tracing::error!("evaluation cycle aborted: {e:?}");
        }
    })
    .await;

    signal_task.abort();
    tracing::info!("UPS evaluation loop stopped");
}

async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!("failed to install signal handlers: {e}");
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            return;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }

    token.cancel();
}
