//! Background Sweeper
//!
//! A single tokio task that wakes on a fixed interval, runs one eviction pass
//! over its [`Store`], and goes back to sleep. Expiry is detected only at
//! sweep boundaries: an entry whose TTL elapses between sweeps stays visible
//! to reads until the next pass removes it. That lag is the design, not a bug.
//!
//! ## Lifecycle
//!
//! ```text
//!          Sweeper::start              stop() / drop
//!   Running ──────────────▶ loop ─────────────────────▶ Stopped (terminal)
//!                            │  ▲
//!                            ▼  │
//!                      sleep(interval), then
//!                      store.sweep_expired()
//! ```
//!
//! The only cancellation point is the interval wait: a stop signal observed
//! there exits immediately with no final sweep, while a pass already underway
//! runs to completion first. `stop` is idempotent (a watch-channel send plus
//! an atomic flag), and dropping the [`Sweeper`] stops it too, so the task is
//! released on every exit path of the owning scope. A handle that is neither
//! stopped nor dropped leaks the task for the process lifetime.
//!
//! Expiry callbacks run inside the sweep's write-lock critical section: they
//! must not call back into the same store, and a slow callback stalls every
//! other store operation until it returns.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::store::map::Store;

/// Sweep interval applied when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(800);

/// Construction options for a [`CacheMap`](crate::store::CacheMap).
#[derive(Debug, Clone)]
pub struct Options {
    /// How long the sweeper sleeps between eviction passes.
    pub sweep_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl Options {
    /// Overrides the sweep interval.
    ///
    /// Only a positive interval takes effect; `Duration::ZERO` leaves the
    /// default in place.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if interval > Duration::ZERO {
            self.sweep_interval = interval;
        }
        self
    }
}

/// Handle to a running background sweeper.
///
/// Stopping is irreversible; the handle cannot restart its task. Dropping the
/// handle stops the task as well.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    running: AtomicBool,
}

impl Sweeper {
    /// Spawns the sweeper task for `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<K, V>(store: Arc<Store<K, V>>, options: Options) -> Self
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(store, options.sweep_interval, shutdown_rx));
        debug!(
            interval_ms = options.sweep_interval.as_millis() as u64,
            "background sweeper started"
        );

        Self {
            shutdown_tx,
            running: AtomicBool::new(true),
        }
    }

    /// Signals the sweeper task to exit. Safe to call more than once.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(true);
            debug!("background sweeper stopped");
        }
    }

    /// Whether the sweeper has not yet been stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop<K, V>(
    store: Arc<Store<K, V>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("sweeper received shutdown signal");
                    return;
                }
            }
        }

        let evicted = store.sweep_expired();
        if evicted > 0 {
            debug!(evicted, remaining = store.len(), "expired entries swept");
        } else {
            trace!("sweep pass found nothing expired");
        }
    }
}
