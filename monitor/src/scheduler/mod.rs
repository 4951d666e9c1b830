//! Cancellable periodic tasks
//!
//! Every recurring piece of work in the monitor (service probe, network
//! probe, status re-evaluation) runs as a [`PeriodicTask`]. Each owner keeps
//! its tasks and cancels them from a single place when monitoring stops.
//!
//! Cancellation reaches into the running iteration: if the token fires while
//! the job is awaiting I/O, the job future is dropped, which aborts any
//! outstanding HTTP request it holds.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `job` every `period`. The first run happens one period from now.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!("Periodic task '{}' started ({}s interval)", name, period.as_secs());

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Periodic task '{}' cancelled mid-run", name);
                        break;
                    }
                    _ = job() => {}
                }
            }

            info!("Periodic task '{}' stopped", name);
        });

        Self {
            name,
            cancel,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
