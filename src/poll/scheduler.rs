//! Interval-driven tool synchronization.
//!
//! Every tick starts one synchronization pass unless the previous pass is
//! still running, in which case the tick is dropped (not queued).

use crate::diagnostics::{SyncEvent, SyncReporter};
use crate::registry::ToolSynchronizer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Idle/busy latch guarding pass submission.
#[derive(Debug, Default)]
pub struct PassLatch {
    busy: AtomicBool,
}

impl PassLatch {
    /// Move from idle to busy. `None` when a pass is already running.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PassGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard {
                latch: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Returns the latch to idle when dropped, including on panic.
#[derive(Debug)]
pub struct PassGuard {
    latch: Arc<PassLatch>,
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.latch.busy.store(false, Ordering::Release);
    }
}

/// What a tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// A pass was started; the handle resolves when it finishes.
    Started(JoinHandle<()>),
    /// A pass was already running; nothing was done.
    Skipped,
}

struct Core {
    sync: Arc<ToolSynchronizer>,
    latch: Arc<PassLatch>,
    reporter: Arc<dyn SyncReporter>,
}

impl Core {
    fn tick(&self) -> TickOutcome {
        let Some(guard) = self.latch.try_acquire() else {
            debug!("Previous tool synchronization still running, skipping tick");
            return TickOutcome::Skipped;
        };

        let sync = self.sync.clone();
        let reporter = self.reporter.clone();
        TickOutcome::Started(tokio::spawn(async move {
            let _guard = guard;
            // The pass runs on its own task so a panic surfaces as a JoinError.
            let pass = tokio::spawn(async move { sync.run_pass().await });
            match pass.await {
                Ok(Ok(true)) => info!("Tool list changed, clients notified"),
                Ok(Ok(false)) => debug!("Tool list unchanged"),
                Ok(Err(e)) => reporter.report(SyncEvent::PassFailed {
                    error: e.to_string(),
                }),
                Err(e) => reporter.report(SyncEvent::PassFailed {
                    error: format!("pass panicked: {e}"),
                }),
            }
        }))
    }
}

/// Background poller re-synchronizing the tool set.
pub struct PollScheduler {
    core: Arc<Core>,
    interval: Duration,
    cancel: CancellationToken,
    timer: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(
        sync: Arc<ToolSynchronizer>,
        interval: Duration,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                sync,
                latch: Arc::new(PassLatch::default()),
                reporter,
            }),
            interval,
            cancel: CancellationToken::new(),
            timer: None,
        }
    }

    /// Start the timer. The first tick fires one interval from now.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        info!("Polling decision runtime every {:?}", self.interval);

        let core = self.core.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        core.tick();
                    }
                    _ = cancel.cancelled() => {
                        debug!("Poll timer stopped");
                        return;
                    }
                }
            }
        }));
    }

    /// Run one tick now.
    pub fn tick(&self) -> TickOutcome {
        self.core.tick()
    }

    /// Whether a pass is in flight.
    pub fn is_busy(&self) -> bool {
        self.core.latch.is_busy()
    }

    /// Cancel the timer and wait for it to exit.
    ///
    /// A pass already in flight runs to completion on its own task.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(timer) = self.timer.take() {
            let _ = timer.await;
        }
    }
}
