use crate::core::{CacheError, Exchange, ExchangeSource, LatestExchange};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How long [`RateUpdater::trigger_refresh`] waits for the loop to pick up a request.
pub const TRIGGER_ACK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub refresh_interval: Duration,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Outcome counters of the refresh cycles run so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub attempts: u64,
    pub successes: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    exchange: Option<Arc<Exchange>>,
    status: RefreshStatus,
}

/// Owns the current exchange snapshot and keeps it fresh.
///
/// A single background task fetches from the source on every interval tick
/// or on request and publishes complete snapshots through a watch channel.
/// Readers only ever clone the `Arc` currently held, so they never wait on
/// the network and never see a partially updated snapshot. A failed refresh
/// leaves the previous snapshot in place.
///
/// [`RateUpdater::close`] stops the task; every read afterwards fails with
/// [`CacheError::Closed`].
pub struct RateUpdater {
    state: watch::Receiver<State>,
    refresh: mpsc::Sender<oneshot::Sender<()>>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl RateUpdater {
    /// Runs the initial fetch, then spawns the refresh loop.
    ///
    /// Never fails: when the initial fetch does not succeed the updater
    /// still starts, reads report [`CacheError::NotYetAvailable`] and the
    /// loop keeps retrying on schedule. Must be called within a tokio runtime.
    ///
    /// A zero refresh interval falls back to the default one.
    pub async fn start<S>(source: S, config: UpdaterConfig) -> Self
    where
        S: ExchangeSource + 'static,
    {
        let refresh_interval = if config.refresh_interval.is_zero() {
            let fallback = UpdaterConfig::default().refresh_interval;
            warn!(?fallback, "Zero refresh interval, using the default");
            fallback
        } else {
            config.refresh_interval
        };

        let (state_tx, state_rx) = watch::channel(State::default());
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        refresh(&source, &state_tx).await;

        tokio::spawn(run(
            source,
            state_tx,
            refresh_rx,
            shutdown_rx,
            refresh_interval,
        ));

        RateUpdater {
            state: state_rx,
            refresh: refresh_tx,
            shutdown: shutdown_tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Last successfully fetched snapshot. Performs no I/O.
    pub fn latest_exchange(&self) -> Result<Arc<Exchange>, CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }
        self.state
            .borrow()
            .exchange
            .clone()
            .ok_or(CacheError::NotYetAvailable)
    }

    pub fn status(&self) -> RefreshStatus {
        self.state.borrow().status.clone()
    }

    /// Asks the loop to refresh now.
    ///
    /// Returns once the loop has picked up the request, not when the refresh
    /// has finished. Use [`RateUpdater::wait_for_attempt`] to wait for that.
    pub async fn trigger_refresh(&self) -> Result<(), CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        let picked_up = tokio::time::timeout(TRIGGER_ACK_TIMEOUT, async {
            self.refresh
                .send(ack_tx)
                .await
                .map_err(|_| CacheError::Closed)?;
            ack_rx.await.map_err(|_| CacheError::Closed)
        })
        .await;

        match picked_up {
            Ok(result) => result,
            Err(_) => Err(CacheError::RefreshNotPickedUp),
        }
    }

    /// Waits until at least `attempt` refresh cycles have completed.
    pub async fn wait_for_attempt(&self, attempt: u64) -> Result<RefreshStatus, CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }

        let mut state = self.state.clone();
        let current = state
            .wait_for(|state| state.status.attempts >= attempt)
            .await
            .map_err(|_| CacheError::Closed)?;
        Ok(current.status.clone())
    }

    /// Stops the refresh loop after its current iteration.
    ///
    /// An in-flight fetch is not interrupted, but nothing waits for it.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.send_replace(true);
        info!("Rate updater closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl LatestExchange for RateUpdater {
    fn latest_exchange(&self) -> Result<Arc<Exchange>, CacheError> {
        RateUpdater::latest_exchange(self)
    }
}

async fn run<S: ExchangeSource>(
    source: S,
    state: watch::Sender<State>,
    mut refresh_requests: mpsc::Receiver<oneshot::Sender<()>>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
) {
    // The initial fetch already happened in `start`
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Either a close or the updater being dropped
            _ = shutdown.changed() => break,
            request = refresh_requests.recv() => match request {
                Some(ack) => {
                    debug!("Refresh requested");
                    let _ = ack.send(());
                }
                None => break,
            },
            _ = ticker.tick() => debug!("Scheduled refresh"),
        }

        refresh(&source, &state).await;
    }

    debug!("Rate updater loop stopped");
}

async fn refresh<S: ExchangeSource + ?Sized>(source: &S, state: &watch::Sender<State>) {
    match source.fetch_exchange().await {
        Ok(exchange) => {
            info!(
                date = %exchange.date,
                currencies = exchange.rates.len(),
                "Exchange rates updated"
            );
            let exchange = Arc::new(exchange);
            state.send_modify(|state| {
                state.exchange = Some(exchange);
                state.status.attempts += 1;
                state.status.successes += 1;
                state.status.last_success = Some(Utc::now());
                state.status.last_error = None;
            });
        }
        Err(e) => {
            let kind = if e.is_format() { "format" } else { "transport" };
            let error = anyhow::Error::new(e);
            warn!(kind, "Failed to refresh exchange rates, keeping previous data: {error:#}");
            state.send_modify(|state| {
                state.status.attempts += 1;
                state.status.last_error = Some(format!("{error:#}"));
            });
        }
    }
}
