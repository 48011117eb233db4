//! The polling loop.
//!
//! [`PollingScheduler`] owns all mutable state of the ticker: the latest
//! snapshot, the exchange-rate table and the backoff counters. It runs one
//! fetch at a time, never starting the next before the previous result has
//! been applied. Hosts steer it through a [`SchedulerHandle`]
//! (`pause`/`resume`/`stop`) and read results either by pulling from the
//! handle or by registering a [`PresentationAdapter`].
//!
//! Lifecycle signals are honoured between iterations and during waits, never
//! in the middle of a request. Provider failures only ever grow the backoff;
//! the loop ends on `stop()` and nothing else.

use crate::core::backoff::{BackoffController, BackoffState};
use crate::core::config::PollingConfig;
use crate::core::currency::{FxRateProvider, FxTable};
use crate::core::error::PollError;
use crate::core::normalize::normalize;
use crate::core::price::PriceProvider;
use crate::core::snapshot::CanonicalPriceSnapshot;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    /// Terminal. Once stopped the scheduler cannot be resumed.
    Stopped,
}

/// What gets published after every iteration that has something to show.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerView {
    pub snapshot: Arc<CanonicalPriceSnapshot>,
    pub fx: Arc<FxTable>,
    /// Failed polls since `snapshot` was fetched.
    pub consecutive_failures: u32,
}

impl TickerView {
    /// True while the provider is failing and `snapshot` is the last good one.
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }
}

/// Push-style consumer of ticker updates.
pub trait PresentationAdapter: Send {
    fn publish(&mut self, view: &TickerView);
}

impl<F> PresentationAdapter for F
where
    F: FnMut(&TickerView) + Send,
{
    fn publish(&mut self, view: &TickerView) {
        self(view)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    /// Nominal spacing between the starts of two healthy polls.
    pub cadence: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Minimum spacing between exchange-rate refreshes.
    pub fx_refresh: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for SchedulerSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            cadence: config.cadence(),
            backoff_base: config.backoff_base(),
            backoff_cap: config.backoff_cap(),
            fx_refresh: config.fx_refresh(),
        }
    }
}

/// Cloneable remote control and read side of a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    control: Arc<watch::Sender<LoopState>>,
    updates: watch::Receiver<Option<TickerView>>,
}

impl SchedulerHandle {
    pub fn pause(&self) {
        self.transition(LoopState::Paused);
    }

    pub fn resume(&self) {
        self.transition(LoopState::Running);
    }

    pub fn stop(&self) {
        self.transition(LoopState::Stopped);
    }

    pub fn state(&self) -> LoopState {
        *self.control.borrow()
    }

    /// Most recently published view, if any poll has succeeded yet.
    pub fn latest(&self) -> Option<TickerView> {
        self.updates.borrow().clone()
    }

    /// Receiver that is notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<Option<TickerView>> {
        self.updates.clone()
    }

    fn transition(&self, next: LoopState) {
        self.control.send_if_modified(|current| {
            if *current == LoopState::Stopped || *current == next {
                return false;
            }
            info!(from = ?*current, to = ?next, "Scheduler state change");
            *current = next;
            true
        });
    }
}

struct PollerState {
    snapshot: Option<Arc<CanonicalPriceSnapshot>>,
    fx: Arc<FxTable>,
    backoff: BackoffController,
}

#[derive(Debug, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Interrupted,
}

pub struct PollingScheduler {
    price_provider: Arc<dyn PriceProvider>,
    fx_provider: Arc<dyn FxRateProvider>,
    settings: SchedulerSettings,
    state: PollerState,
    adapters: Vec<Box<dyn PresentationAdapter>>,
    handle: SchedulerHandle,
    control: watch::Receiver<LoopState>,
    updates: watch::Sender<Option<TickerView>>,
    pending_fx: Option<JoinHandle<FxTable>>,
    last_fx_request: Option<Instant>,
}

impl PollingScheduler {
    pub fn new(
        price_provider: Arc<dyn PriceProvider>,
        fx_provider: Arc<dyn FxRateProvider>,
        settings: SchedulerSettings,
    ) -> Self {
        let (control_tx, control) = watch::channel(LoopState::Running);
        let (updates, updates_rx) = watch::channel(None);

        Self {
            price_provider,
            fx_provider,
            state: PollerState {
                snapshot: None,
                fx: Arc::new(FxTable::fallback()),
                backoff: BackoffController::with_limits(
                    settings.backoff_base,
                    settings.backoff_cap,
                ),
            },
            settings,
            adapters: Vec::new(),
            handle: SchedulerHandle {
                control: Arc::new(control_tx),
                updates: updates_rx,
            },
            control,
            updates,
            pending_fx: None,
            last_fx_request: None,
        }
    }

    pub fn with_adapter(mut self, adapter: impl PresentationAdapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn backoff(&self) -> &BackoffState {
        self.state.backoff.state()
    }

    pub fn next_delay(&self) -> Duration {
        self.state.backoff.delay()
    }

    /// Initial fetch of rates and price, awaited together.
    pub async fn bootstrap(&mut self) -> Option<TickerView> {
        debug!("Bootstrapping ticker");
        let (fx, outcome) = futures::join!(
            self.fx_provider.fetch_rates(),
            fetch_snapshot(self.price_provider.as_ref())
        );
        self.state.fx = Arc::new(fx);
        self.last_fx_request = Some(Instant::now());

        if let Err(e) = self.apply(outcome) {
            debug!(error = %e, "Bootstrap fetch failed");
        }
        self.handle.latest()
    }

    /// Runs a single fetch-normalize-publish cycle.
    ///
    /// The error is returned for inspection only; it has already been
    /// recorded in the backoff and the last good snapshot republished.
    pub async fn poll_once(&mut self) -> Result<(), PollError> {
        let outcome = fetch_snapshot(self.price_provider.as_ref()).await;
        self.apply(outcome)
    }

    /// Bootstraps, then polls until stopped.
    pub async fn run(mut self) {
        self.bootstrap().await;
        info!(cadence_ms = self.settings.cadence.as_millis() as u64, "Polling started");

        loop {
            if self.wait_until_running().await == LoopState::Stopped {
                break;
            }
            if self.harvest_fx() {
                self.publish();
            }

            let started = Instant::now();
            let delay = self.state.backoff.delay();
            if self.sleep_interruptibly(delay).await == Wake::Interrupted {
                continue;
            }

            // already recorded and logged by the backoff controller
            let _ = self.poll_once().await;

            let wait = self.next_wait(started.elapsed());
            self.sleep_interruptibly(wait).await;
        }

        if let Some(pending) = self.pending_fx.take() {
            pending.abort();
        }
        info!("Polling stopped");
    }

    fn apply(&mut self, outcome: Result<CanonicalPriceSnapshot, PollError>) -> Result<(), PollError> {
        match outcome {
            Ok(snapshot) => {
                debug!(
                    timestamp = snapshot.timestamp_seconds,
                    spot = ?snapshot.spot_price_usd_per_ounce,
                    "Snapshot updated"
                );
                self.state.snapshot = Some(Arc::new(snapshot));
                self.state.backoff.record_success();
                self.refresh_fx_in_background();
                self.publish();
                Ok(())
            }
            Err(e) => {
                self.state.backoff.record_failure(&e);
                // stale but available
                self.publish();
                Err(e)
            }
        }
    }

    fn next_wait(&self, elapsed: Duration) -> Duration {
        let backoff = self.state.backoff.delay();
        if backoff.is_zero() {
            self.settings.cadence.saturating_sub(elapsed)
        } else {
            backoff
        }
    }

    fn publish(&mut self) {
        self.harvest_fx();
        let Some(snapshot) = self.state.snapshot.clone() else {
            return;
        };

        let view = TickerView {
            snapshot,
            fx: Arc::clone(&self.state.fx),
            consecutive_failures: self.state.backoff.consecutive_failures(),
        };
        for adapter in &mut self.adapters {
            adapter.publish(&view);
        }
        self.updates.send_replace(Some(view));
    }

    fn refresh_fx_in_background(&mut self) {
        if self.pending_fx.is_some() {
            return;
        }
        if let Some(last) = self.last_fx_request {
            if last.elapsed() < self.settings.fx_refresh {
                return;
            }
        }

        debug!("Refreshing FX rates");
        let provider = Arc::clone(&self.fx_provider);
        self.pending_fx = Some(tokio::spawn(async move { provider.fetch_rates().await }));
        self.last_fx_request = Some(Instant::now());
    }

    /// Takes the result of a finished FX refresh. Returns true if the table changed.
    fn harvest_fx(&mut self) -> bool {
        let Some(pending) = self.pending_fx.as_mut() else {
            return false;
        };

        match pending.now_or_never() {
            None => false,
            Some(Ok(fx)) => {
                self.pending_fx = None;
                let changed = *self.state.fx != fx;
                self.state.fx = Arc::new(fx);
                changed
            }
            Some(Err(e)) => {
                self.pending_fx = None;
                warn!(error = %e, "FX refresh task failed");
                false
            }
        }
    }

    async fn wait_until_running(&mut self) -> LoopState {
        loop {
            let state = *self.control.borrow_and_update();
            if state != LoopState::Paused {
                return state;
            }
            debug!("Polling paused");
            if self.control.changed().await.is_err() {
                return LoopState::Stopped;
            }
        }
    }

    async fn sleep_interruptibly(&mut self, duration: Duration) -> Wake {
        if duration.is_zero() {
            return Wake::Elapsed;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Wake::Elapsed,
            _ = self.control.changed() => Wake::Interrupted,
        }
    }
}

async fn fetch_snapshot(
    provider: &dyn PriceProvider,
) -> Result<CanonicalPriceSnapshot, PollError> {
    let raw = provider.fetch_once().await?;
    Ok(normalize(&raw)?)
}
