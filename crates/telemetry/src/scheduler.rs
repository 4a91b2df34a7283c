//! Background report scheduling.
//!
//! A [`Scheduler`] owns at most one background task per reporter. The task
//! sends a first-contact report right away, then a ping every interval. It
//! wakes on a short tick so that [`Scheduler::disable`] and operator opt-outs
//! take effect promptly.
//!
//! The scheduler state and the opt-out decision share one lock, checked
//! before every report. Once `disable()` returns, a report that already passed
//! that check may still complete, but no later tick starts another one.
//! Failures are only logged while the debug flag is set.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use metrics_lite_core::error::Result;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::Reporter;

/// Default time between pings.
pub const PING_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// How often the background task checks for cancellation and deadlines.
pub const TICK: Duration = Duration::from_millis(100);

/// Observable lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No background task.
    Idle,
    /// A background task is reporting.
    Running,
    /// Disabled, but the previous task is still finishing an exchange.
    Stopping,
}

struct Active {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    active: Option<Active>,
    /// Task of the last disabled run, awaited by the next run before it reports.
    previous: Option<JoinHandle<()>>,
    generation: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives periodic reporting for one [`Reporter`].
pub struct Scheduler {
    reporter: Arc<Reporter>,
    ping_interval: Duration,
    tick: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl Scheduler {
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self {
            reporter,
            ping_interval: PING_INTERVAL,
            tick: TICK,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// Start reporting unless opted out.
    ///
    /// Returns `Ok(false)` when opted out, `Ok(true)` when a task is running
    /// afterwards (including when one already was). Must be called from
    /// within a tokio runtime.
    pub fn start(&self) -> Result<bool> {
        let mut inner = lock(&self.inner);

        if self.reporter.gate().is_opted_out()? {
            return Ok(false);
        }

        if inner.active.is_some() {
            return Ok(true);
        }

        inner.generation += 1;
        let generation = inner.generation;
        let token = CancellationToken::new();
        let run = ReportLoop {
            reporter: self.reporter.clone(),
            inner: self.inner.clone(),
            token: token.clone(),
            generation,
            ping_interval: self.ping_interval,
            tick: self.tick,
        };
        let previous = inner.previous.take();
        let handle = tokio::spawn(run.run(previous));

        inner.active = Some(Active {
            generation,
            token,
            handle,
        });
        info!(
            plugin = %self.reporter.plugin_name(),
            generation,
            "metrics reporting started"
        );
        Ok(true)
    }

    /// Start reporting if nothing is running.
    pub fn enable(&self) -> Result<()> {
        if !self.is_running() {
            self.start()?;
        }
        Ok(())
    }

    /// Stop reporting. The task observes the cancellation within one tick;
    /// an exchange already in flight is allowed to finish.
    pub fn disable(&self) {
        let mut inner = lock(&self.inner);
        if let Some(active) = inner.active.take() {
            active.token.cancel();
            inner.previous = Some(active.handle);
            info!(
                plugin = %self.reporter.plugin_name(),
                generation = active.generation,
                "metrics reporting disabled"
            );
        }
    }

    pub fn state(&self) -> SchedulerState {
        let inner = lock(&self.inner);
        if inner.active.is_some() {
            SchedulerState::Running
        } else if inner
            .previous
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            SchedulerState::Stopping
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner).active.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.disable();
    }
}

/// State owned by one background task.
struct ReportLoop {
    reporter: Arc<Reporter>,
    inner: Arc<Mutex<Inner>>,
    token: CancellationToken,
    generation: u64,
    ping_interval: Duration,
    tick: Duration,
}

impl ReportLoop {
    async fn run(self, previous: Option<JoinHandle<()>>) {
        if let Some(previous) = previous {
            // Reports stay totally ordered across a disable/start cycle.
            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = previous => {}
            }
        }

        let mut first_post = true;
        // `None` once the next deadline is beyond what `Instant` can represent.
        let mut next_post = Some(Instant::now());
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let due = next_post.is_some_and(|deadline| Instant::now() >= deadline);
            if due {
                if self.should_stop() {
                    return;
                }

                let is_ping = !first_post;
                if let Err(err) = self.reporter.post_once(is_ping).await {
                    if self.reporter.debug_enabled() {
                        warn!(
                            plugin = %self.reporter.plugin_name(),
                            ping = is_ping,
                            error = %err,
                            "metrics report failed"
                        );
                    }
                }
                first_post = false;
                next_post = Instant::now().checked_add(self.ping_interval);
            }

            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = ticker.tick() => {}
            }
        }
    }

    /// Check cancellation and opt-out under the scheduler lock. On opt-out
    /// the scheduler is returned to idle if it still belongs to this task.
    fn should_stop(&self) -> bool {
        let mut inner = lock(&self.inner);

        if self.token.is_cancelled() {
            return true;
        }

        let opted_out = self.reporter.gate().is_opted_out().unwrap_or_else(|err| {
            debug!(
                plugin = %self.reporter.plugin_name(),
                error = %err,
                "could not read metrics configuration, stopping"
            );
            true
        });
        if !opted_out {
            return false;
        }

        let owns_state = inner
            .active
            .as_ref()
            .is_some_and(|active| active.generation == self.generation);
        if owns_state {
            if let Some(active) = inner.active.take() {
                active.token.cancel();
            }
        }
        info!(
            plugin = %self.reporter.plugin_name(),
            generation = self.generation,
            "metrics opted out, reporting stopped"
        );
        true
    }
}
