//! Lifecycle runner: turns app state changes into sync cycles.
//!
//! The controller owns the polling timer so the engine never does. Every
//! cycle is spawned rather than awaited inside the loop, so a slow fetch
//! never delays a background transition or an unmount. Stopping the timer
//! cancels future cycles only; a cycle already in flight still commits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use notifsync_core::types::NotificationResponse;
use notifsync_engine::{CycleOutcome, SyncEngine};

/// Application visibility as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Visible and interactive.
    Foreground,
    /// Not visible.
    Background,
    /// Visible but not receiving input (e.g. a system dialog is on top).
    Inactive,
}

impl AppState {
    /// Whether polling should run in this state.
    pub fn is_foreground(self) -> bool {
        matches!(self, Self::Foreground)
    }
}

/// Events delivered to a mounted controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The OS reported a new app state.
    StateChanged(AppState),
    /// The notification screen regained focus.
    FocusGained,
}

/// Drives a [`SyncEngine`] from lifecycle events.
#[derive(Debug)]
pub struct LifecycleController {
    /// Engine to drive
    engine: Arc<SyncEngine>,
    /// Polling period while in the foreground
    period: Duration,
}

impl LifecycleController {
    /// Create a controller polling at the engine's configured interval.
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        let period = engine.config().poll_interval();
        Self { engine, period }
    }

    /// Override the polling period.
    pub fn with_interval(mut self, period: Duration) -> Self {
        self.period = period.max(Duration::from_millis(1));
        self
    }

    /// Start the controller in `initial` state.
    ///
    /// Runs one cycle immediately and, if `initial` is foreground, starts
    /// the polling interval. Must be called inside a Tokio runtime.
    pub fn mount(self, initial: AppState) -> LifecycleHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let taps = self.engine.scheduler().subscribe();

        let task = tokio::spawn(self.run(initial, events_rx, taps, shutdown_rx));

        LifecycleHandle {
            events: events_tx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(
        self,
        initial: AppState,
        mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
        mut taps: broadcast::Receiver<NotificationResponse>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            period_ms = self.period.as_millis() as u64,
            state = ?initial,
            "Lifecycle controller mounted"
        );

        let mut state = initial;
        self.trigger("mount");
        let mut ticker = if state.is_foreground() {
            Some(self.start_ticker())
        } else {
            None
        };
        let mut taps_open = true;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(event) = events.recv() => {
                    state = self.on_event(event, state, &mut ticker);
                }
                _ = next_tick(&mut ticker) => {
                    self.trigger("interval");
                }
                tap = taps.recv(), if taps_open => match tap {
                    Ok(response) => self.dispatch_tap(response),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification tap stream lagged; taps dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Notification tap stream closed");
                        taps_open = false;
                    }
                },
            }
        }

        self.engine.stop_polling();
        info!("Lifecycle controller unmounted");
    }

    fn on_event(
        &self,
        event: LifecycleEvent,
        state: AppState,
        ticker: &mut Option<Interval>,
    ) -> AppState {
        match event {
            LifecycleEvent::StateChanged(next) if next == state => {
                debug!(state = ?next, "App state unchanged");
                state
            }
            LifecycleEvent::StateChanged(next) if next.is_foreground() => {
                info!("App entered foreground");
                self.trigger("foreground");
                if ticker.is_none() {
                    *ticker = Some(self.start_ticker());
                }
                next
            }
            LifecycleEvent::StateChanged(next) => {
                info!(state = ?next, "App left foreground");
                ticker.take();
                self.engine.stop_polling();
                next
            }
            LifecycleEvent::FocusGained => {
                self.trigger("focus");
                state
            }
        }
    }

    fn start_ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.engine.start_polling();
        ticker
    }

    fn trigger(&self, reason: &'static str) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            match engine.run_cycle().await {
                CycleOutcome::Skipped => debug!(reason, "Sync cycle already running"),
                CycleOutcome::Failed(failure) => {
                    debug!(reason, error = %failure.message, "Sync cycle failed")
                }
                _ => debug!(reason, "Sync cycle finished"),
            }
        });
    }

    fn dispatch_tap(&self, response: NotificationResponse) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            let destination = engine.handle_response(response).await;
            info!(destination = %destination.href(), "Opened notification from device");
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

/// Handle to a mounted [`LifecycleController`].
///
/// Dropping the handle also stops the controller.
#[derive(Debug)]
pub struct LifecycleHandle {
    /// Event channel into the controller
    events: mpsc::UnboundedSender<LifecycleEvent>,
    /// Shutdown signal
    shutdown: watch::Sender<bool>,
    /// Controller task, until unmounted
    task: Option<JoinHandle<()>>,
}

impl LifecycleHandle {
    /// Report a new app state. Returns `false` once unmounted.
    pub fn app_state_changed(&self, state: AppState) -> bool {
        self.send(LifecycleEvent::StateChanged(state))
    }

    /// Report that the notification screen regained focus.
    pub fn focus_gained(&self) -> bool {
        self.send(LifecycleEvent::FocusGained)
    }

    /// Deliver `event` to the controller.
    pub fn send(&self, event: LifecycleEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Whether the controller is still running.
    pub fn is_mounted(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop polling and release the tap subscription.
    ///
    /// Safe to call more than once.
    pub async fn unmount(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let _ = self.shutdown.send(true);
        if let Err(e) = task.await {
            warn!(error = %e, "Lifecycle controller task ended abnormally");
        }
    }
}
