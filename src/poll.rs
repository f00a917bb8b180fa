//! Background refresh of the pending-share inbox.
//!
//! The poller ticks on a fixed interval (60 s unless configured otherwise),
//! starting immediately. Each tick refreshes the shared inbox and reports the
//! new list; failures are logged by the inbox and the next tick retries.

use std::sync::Arc;
use std::time::Duration;

use survey::SurveyShare;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::shares::{ShareInbox, ShareRemote};

#[cfg(test)]
#[path = "poll_test.rs"]
mod poll_test;

/// Spawn the share poller. Abort the returned handle to stop it.
pub fn spawn_share_poller<R>(
    inbox: Arc<Mutex<ShareInbox<R>>>,
    interval: Duration,
    mut on_refresh: impl FnMut(&[SurveyShare]) + Send + 'static,
) -> JoinHandle<()>
where
    R: ShareRemote + 'static,
{
    info!(interval_secs = interval.as_secs(), "share poller configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let mut inbox = inbox.lock().await;
            if let Ok(shares) = inbox.refresh().await {
                debug!(count = shares.len(), "pending shares refreshed");
                on_refresh(shares);
            }
        }
    })
}
