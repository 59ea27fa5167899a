//! Background jobs: the feed poller and the message dispatcher.
//!
//! Both run on a fixed delay: the next run starts one interval after the
//! previous one finished. They stop when the shutdown signal fires.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::services::{dispatch, feed::FeedPoller};
use crate::state::AppState;

/// Sleeps for `duration` unless shutdown is signalled first.
///
/// Returns `true` when the full duration elapsed.
pub async fn wait_or_shutdown(duration: Duration, shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = shutdown_rx.recv() => false,
    }
}

/// Spawns the feed poller.
pub fn spawn_feed_poller(state: AppState) -> JoinHandle<()> {
    let mut shutdown_rx = state.subscribe_shutdown();
    let initial_delay = state.config.feed_poll_initial_delay();
    let interval = state.config.feed_poll_interval();

    tokio::spawn(async move {
        let mut poller = FeedPoller::new(state);
        tracing::debug!(since = %poller.last_polled(), "Feed poller started");

        if !wait_or_shutdown(initial_delay, &mut shutdown_rx).await {
            tracing::info!("Feed poller stopped");
            return;
        }

        loop {
            poller.poll().await;

            if !wait_or_shutdown(interval, &mut shutdown_rx).await {
                break;
            }
        }

        tracing::info!("Feed poller stopped");
    })
}

/// Spawns the dispatcher, which sends one batch and then settles finished
/// campaigns on every run.
pub fn spawn_dispatcher(state: AppState) -> JoinHandle<()> {
    let mut shutdown_rx = state.subscribe_shutdown();
    let initial_delay = state.config.dispatch_initial_delay();
    let interval = state.config.dispatch_interval();
    let batch_size = state.config.dispatch_batch_size;

    tokio::spawn(async move {
        if !wait_or_shutdown(initial_delay, &mut shutdown_rx).await {
            tracing::info!("Dispatcher stopped");
            return;
        }

        loop {
            if let Err(err) = dispatch::send_queued_messages(&state, batch_size).await {
                tracing::error!(error = %err, "Dispatch run failed");
            }
            if let Err(err) = dispatch::settle_campaigns(&state).await {
                tracing::error!(error = %err, "Failed to settle campaigns");
            }

            if !wait_or_shutdown(interval, &mut shutdown_rx).await {
                break;
            }
        }

        tracing::info!("Dispatcher stopped");
    })
}
