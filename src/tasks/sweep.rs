//! Sweep Task
//!
//! Background task that runs a sweep callback at a fixed interval until its
//! cancellation token fires.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawns a task that calls `tick` every `interval` until `token` is cancelled.
///
/// The first tick happens one full interval after spawning. Cancellation is
/// observed between ticks, never in the middle of one.
///
/// # Example
/// ```ignore
/// let token = CancellationToken::new();
/// let handle = spawn_sweep_task(&Handle::current(), "lru".into(), interval, token.clone(), || {
///     cache.remove_stale_entries();
/// });
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task<F>(
    runtime: &Handle,
    name: String,
    interval: Duration,
    token: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    runtime.spawn(async move {
        info!("Starting {} sweep task with interval of {:?}", name, interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => tick(),
            }
        }

        info!("{} sweep task stopped", name);
    })
}

// == Sweeper ==
/// Owns a group of sweep tasks sharing one cancellation token.
///
/// Dropping the sweeper cancels its tasks. A cancelled sweeper stays
/// cancelled; start a new one to sweep again.
#[derive(Debug, Default)]
pub struct Sweeper {
    token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Sweeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns one more task under this sweeper's token.
    pub fn spawn<F>(&self, runtime: &Handle, name: impl Into<String>, interval: Duration, tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        let handle = spawn_sweep_task(runtime, name.into(), interval, self.token.clone(), tick);
        self.handles.lock().push(handle);
    }

    /// Signals every task to stop without waiting for them.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Signals every task to stop and waits until they have exited.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Sweep task ended abnormally: {}", e);
            }
        }
    }

    /// True while at least one task is alive and no stop was requested.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.handles.lock().iter().any(|h| !h.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_ticks_at_interval() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let token = CancellationToken::new();

        let handle = spawn_sweep_task(
            &Handle::current(),
            "test".to_string(),
            Duration::from_secs(1),
            token.clone(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_on_cancel() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let token = CancellationToken::new();

        let handle = spawn_sweep_task(
            &Handle::current(),
            "test".to_string(),
            Duration::from_secs(1),
            token.clone(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_shutdown_waits_for_tasks() {
        let sweeper = Sweeper::new();
        sweeper.spawn(&Handle::current(), "a", Duration::from_secs(1), || {});
        sweeper.spawn(&Handle::current(), "b", Duration::from_secs(1), || {});
        assert!(sweeper.is_running());

        sweeper.shutdown().await;
        assert!(!sweeper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drop_cancels_tasks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let sweeper = Sweeper::new();
        sweeper.spawn(&Handle::current(), "dropped", Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(sweeper);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
