//! Cancellable one-second tick sources
//!
//! The timer machine owns exactly one [`TickSource`]. Every restart bumps a
//! generation number and every tick carries the generation it was produced
//! for, so a tick already queued by a cancelled source is recognisably stale
//! and can never decrement a counter twice.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default tick period
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A single tick delivered to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// A repeating timer the machine can start and cancel
pub trait TickSource: Send {
    /// Cancel any active stream and start a new one; returns its generation
    fn restart(&mut self) -> u64;

    /// Stop the active stream, if any
    fn cancel(&mut self);

    /// Generation of the active stream
    fn active(&self) -> Option<u64>;
}

/// Tick source backed by a tokio interval task
///
/// Ticks are sent over an unbounded channel; the host receives them and hands
/// each one to the machine.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl IntervalTicker {
    /// Create a ticker and the receiver its ticks arrive on
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let ticker = Self {
            period,
            sender,
            handle: None,
            generation: 0,
        };
        (ticker, receiver)
    }
}

impl TickSource for IntervalTicker {
    fn restart(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let sender = self.sender.clone();
        self.handle = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if sender.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));

        tracing::debug!(generation, "Tick source started");
        generation
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(generation = self.generation, "Tick source cancelled");
        }
    }

    fn active(&self) -> Option<u64> {
        self.handle.as_ref().map(|_| self.generation)
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tick source driven by hand; ticks are produced by the caller
#[derive(Debug, Default)]
pub struct ManualTicker {
    generation: u64,
    active: bool,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSource for ManualTicker {
    fn restart(&mut self) -> u64 {
        self.generation += 1;
        self.active = true;
        self.generation
    }

    fn cancel(&mut self) {
        self.active = false;
    }

    fn active(&self) -> Option<u64> {
        self.active.then_some(self.generation)
    }
}
