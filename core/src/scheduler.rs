//! # Scan Scheduler
//!
//! A two-state machine (`Stopped` ⇄ `Running`) around one background
//! tokio task. The task polls a coarse interval for a due trigger and
//! runs the supplied job inline when one arrives, so a long-running scan
//! simply delays the next due-check: at most one scheduled run is ever
//! active. `stop()` cancels future triggers and waits for the loop to
//! exit; it never interrupts a job that is already executing.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vigil_common::config::Cadence;

const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct ScanScheduler {
    cadence: Cadence,
    poll_interval: Duration,
    state: Mutex<State>,
}

enum State {
    Stopped,
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

impl ScanScheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self::with_poll_interval(cadence, POLL_INTERVAL)
    }

    pub fn with_poll_interval(cadence: Cadence, poll_interval: Duration) -> Self {
        Self {
            cadence,
            poll_interval,
            state: Mutex::new(State::Stopped),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock().unwrap(), State::Running { .. })
    }

    /// Transitions to `Running` and spawns the polling loop. Warns and
    /// does nothing when already running.
    pub fn start<F, Fut>(&self, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, State::Running { .. }) {
            warn!("scheduler already running, ignoring start request");
            return;
        }

        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let cadence = self.cadence;
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut next = next_trigger(Local::now(), &cadence);
            info!("scheduler started, next scan at {next}");
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {
                        if Local::now() < next {
                            continue;
                        }
                        info!("starting scheduled scan");
                        // runs inline: the next due-check waits for the job
                        if let Err(e) = job().await {
                            error!("scheduled scan failed: {e:#}");
                        }
                        next = next_trigger(Local::now(), &cadence);
                        info!("next scan at {next}");
                    }
                }
            }
            info!("scheduler loop exited");
        });

        *state = State::Running { cancel, handle };
    }

    /// Transitions to `Stopped`, waiting until the loop has terminated.
    /// Does nothing when already stopped. Only future triggers are
    /// cancelled; an in-flight job runs to completion first.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap();
            std::mem::replace(&mut *state, State::Stopped)
        };
        match previous {
            State::Stopped => warn!("scheduler not running, ignoring stop request"),
            State::Running { cancel, handle } => {
                cancel.cancel();
                if let Err(e) = handle.await {
                    error!("scheduler loop ended abnormally: {e}");
                }
                info!("scheduler stopped");
            }
        }
    }
}

/// Computes the first trigger instant strictly after `after`.
pub fn next_trigger(after: DateTime<Local>, cadence: &Cadence) -> DateTime<Local> {
    match *cadence {
        Cadence::Daily { at } => {
            let today = at_time(after, at);
            if today > after {
                today
            } else {
                at_time(after + ChronoDuration::days(1), at)
            }
        }
        Cadence::Weekly { day, at } => {
            let days_ahead = (day.num_days_from_monday() as i64
                - after.weekday().num_days_from_monday() as i64)
                .rem_euclid(7);
            let candidate = at_time(after + ChronoDuration::days(days_ahead), at);
            if candidate > after {
                candidate
            } else {
                at_time(candidate + ChronoDuration::days(7), at)
            }
        }
    }
}

fn at_time(day: DateTime<Local>, time: chrono::NaiveTime) -> DateTime<Local> {
    // on a DST gap the earliest valid instant after the wall time wins
    day.with_time(time).earliest().unwrap_or(day)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
