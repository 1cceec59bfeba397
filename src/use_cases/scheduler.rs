// Tick scheduling: a timer task posts update markers, a worker task integrates the world.

use crate::domain::{StepReport, World, step_world};
use crate::use_cases::engine::Shared;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, trace, warn};

/// Running timer/worker pair owned by an engine.
///
/// Dropping the handle closes the stop channel, which ends both tasks.
pub(crate) struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    timer: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals both tasks and waits until they have exited.
    pub(crate) async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        for (task, handle) in [("timer", self.timer), ("worker", self.worker)] {
            if let Err(e) = handle.await {
                warn!(task, error = %e, "scheduler task ended abnormally");
            }
        }
    }
}

pub(crate) fn spawn(shared: Arc<Shared>, tick_interval: Duration) -> SchedulerHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    // Depth one: a pending marker absorbs further firings until the worker takes it.
    let (marker_tx, marker_rx) = mpsc::channel::<()>(1);

    let timer = tokio::spawn(timer_task(tick_interval, marker_tx, stop_rx.clone()));
    let worker = tokio::spawn(worker_task(shared, marker_rx, stop_rx));

    SchedulerHandle {
        stop_tx,
        timer,
        worker,
    }
}

async fn timer_task(
    tick_interval: Duration,
    marker_tx: mpsc::Sender<()>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let start = time::Instant::now() + tick_interval;
    let mut interval = time::interval_at(start, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = interval.tick() => match marker_tx.try_send(()) {
                Ok(()) => {}
                Err(TrySendError::Full(())) => trace!("update pending; firing coalesced"),
                Err(TrySendError::Closed(())) => break,
            },
        }
    }
    debug!("timer task stopped");
}

async fn worker_task(
    shared: Arc<Shared>,
    mut marker_rx: mpsc::Receiver<()>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            marker = marker_rx.recv() => {
                if marker.is_none() {
                    break;
                }
                run_pass(&shared).await;
            }
        }
    }
    debug!("worker task stopped");
}

// One scheduled pass: elapsed time is measured from the previous pass.
async fn run_pass(shared: &Shared) {
    let mut guard = shared.state.write().await;
    let state = &mut *guard;

    let now = shared.clock.now();
    let elapsed = state
        .last_update
        .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
    state.last_update = Some(now);

    let Some(world) = state.world.as_mut() else {
        return;
    };
    state.ticks += 1;
    integrate(world, elapsed, state.ticks);
}

/// Runs one physics pass over `world`, logging anomalies instead of propagating them.
pub(crate) fn integrate(world: &mut World, elapsed: f64, tick: u64) -> Option<StepReport> {
    match catch_unwind(AssertUnwindSafe(|| step_world(world, elapsed))) {
        Ok(report) => {
            if !report.non_finite.is_empty() {
                warn!(tick, objects = ?report.non_finite, "non-finite object state");
            }
            trace!(
                tick,
                elapsed,
                moved = report.objects_moved,
                expired = report.impulses_expired,
                "physics pass"
            );
            Some(report)
        }
        Err(_) => {
            error!(tick, elapsed, "physics pass panicked");
            None
        }
    }
}
