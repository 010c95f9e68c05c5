//! Deadline-based countdown ticker.
//!
//! A ticker counts one step down to zero. It never decrements a counter:
//! every check recomputes the remaining time from the absolute deadline
//! stored at `start`, so a late check (throttled host, busy runtime) still
//! reports the true remaining time.
//!
//! Two implementations share [`Countdown`]:
//!
//! - [`BackgroundTicker`] runs on its own tokio task, isolated from whatever
//!   context owns the engine.
//! - [`InlineTicker`] is the fallback when no tokio runtime is available. It
//!   only checks its deadline when the owner calls [`Ticker::poll`].
//!
//! Host sleep/wake or clock jumps are not corrected for beyond recomputing
//! from the deadline on the next check.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};

/// Default period between deadline checks.
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// What a ticker reports for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TickKind {
    Tick { remaining_secs: u32 },
    Complete,
}

/// A ticker report, tagged with the generation of the `start` that
/// produced it. The engine drops events whose generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEvent {
    pub generation: u64,
    pub kind: TickKind,
}

/// Commands sent to a ticker. Both are fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerCommand {
    Start { generation: u64, duration_secs: u32 },
    Stop,
}

/// The engine's view of a ticker.
pub trait Ticker: Send + std::fmt::Debug {
    /// Begin counting `duration_secs` down from now, replacing any run in
    /// progress.
    fn start(&mut self, generation: u64, duration_secs: u32);

    /// Halt checks. No-op when already stopped.
    fn stop(&mut self);

    /// Give a same-context ticker the chance to check its deadline.
    /// Background tickers check on their own and ignore this.
    fn poll(&mut self) {}

    /// `true` when this ticker runs outside the owner's context.
    fn is_background(&self) -> bool;
}

/// An absolute deadline for one ticker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    generation: u64,
    deadline_ms: u64,
}

impl Countdown {
    pub fn start(generation: u64, duration_secs: u32, now_ms: u64) -> Self {
        Self {
            generation,
            deadline_ms: now_ms.saturating_add(u64::from(duration_secs) * 1_000),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clock time at which the run completes.
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// `ceil((deadline - now) / 1000)`, zero once the deadline has passed.
    pub fn remaining_secs(&self, now_ms: u64) -> u32 {
        let left_ms = self.deadline_ms.saturating_sub(now_ms);
        u32::try_from(left_ms.div_ceil(1_000)).unwrap_or(u32::MAX)
    }

    /// Produce the event for a check at `now_ms`.
    pub fn check(&self, now_ms: u64) -> TickerEvent {
        let kind = match self.remaining_secs(now_ms) {
            0 => TickKind::Complete,
            remaining_secs => TickKind::Tick { remaining_secs },
        };
        TickerEvent {
            generation: self.generation,
            kind,
        }
    }
}

/// Ticker settings taken from configuration.
#[derive(Debug, Clone)]
pub struct TickerOptions {
    pub interval: Duration,
    pub clock: Arc<dyn Clock>,
}

impl TickerOptions {
    pub fn with_interval_ms(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms.max(1)),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for TickerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            clock: Arc::new(SystemClock::new()),
        }
    }
}

/// Create a ticker and the receiver its events arrive on.
///
/// Spawns a [`BackgroundTicker`] on the current tokio runtime. Without a
/// runtime, degrades to an [`InlineTicker`] that must be driven through
/// [`Ticker::poll`].
pub fn spawn(options: TickerOptions) -> (Box<dyn Ticker>, UnboundedReceiver<TickerEvent>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let ticker = BackgroundTicker::spawn_on(&handle, options, events_tx);
            (Box::new(ticker), events_rx)
        }
        Err(_) => {
            warn!("no async runtime available, falling back to inline ticker");
            (Box::new(InlineTicker::new(options.clock, events_tx)), events_rx)
        }
    }
}

/// Ticker running on its own tokio task.
///
/// Dropping the handle closes the command channel, which ends the task.
#[derive(Debug)]
pub struct BackgroundTicker {
    commands: UnboundedSender<TickerCommand>,
}

impl BackgroundTicker {
    pub fn spawn_on(
        handle: &tokio::runtime::Handle,
        options: TickerOptions,
        events: UnboundedSender<TickerEvent>,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        handle.spawn(run_background(commands_rx, events, options));
        Self { commands }
    }

    fn send(&self, command: TickerCommand) {
        // The task only exits once this handle is gone, so a failed send
        // means the runtime is shutting down.
        if self.commands.send(command).is_err() {
            debug!(?command, "ticker task is gone, command dropped");
        }
    }
}

impl Ticker for BackgroundTicker {
    fn start(&mut self, generation: u64, duration_secs: u32) {
        self.send(TickerCommand::Start {
            generation,
            duration_secs,
        });
    }

    fn stop(&mut self) {
        self.send(TickerCommand::Stop);
    }

    fn is_background(&self) -> bool {
        true
    }
}

async fn run_background(
    mut commands: UnboundedReceiver<TickerCommand>,
    events: UnboundedSender<TickerEvent>,
    options: TickerOptions,
) {
    let clock = options.clock;
    let interval_ms = u64::try_from(options.interval.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    let mut active: Option<Countdown> = None;
    let mut last_reported: Option<u32> = None;
    let mut next_check_ms = 0;

    loop {
        // Wake at the next interval or the deadline, whichever is sooner.
        let wait_ms = active.map_or(0, |countdown| {
            next_check_ms
                .min(countdown.deadline_ms())
                .saturating_sub(clock.now_ms())
        });

        tokio::select! {
            command = commands.recv() => match command {
                Some(TickerCommand::Start { generation, duration_secs }) => {
                    let now_ms = clock.now_ms();
                    active = Some(Countdown::start(generation, duration_secs, now_ms));
                    last_reported = Some(duration_secs);
                    next_check_ms = now_ms.saturating_add(interval_ms);
                }
                Some(TickerCommand::Stop) => {
                    active = None;
                    last_reported = None;
                }
                None => break,
            },
            _ = tokio::time::sleep(Duration::from_millis(wait_ms)), if active.is_some() => {
                let Some(countdown) = active else { continue };
                let now_ms = clock.now_ms();
                if now_ms >= next_check_ms {
                    next_check_ms = now_ms.saturating_add(interval_ms);
                }
                let event = countdown.check(now_ms);
                match event.kind {
                    TickKind::Complete => {
                        active = None;
                        last_reported = None;
                    }
                    TickKind::Tick { remaining_secs } => {
                        if last_reported == Some(remaining_secs) {
                            continue;
                        }
                        last_reported = Some(remaining_secs);
                    }
                }
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }
    debug!("background ticker stopped");
}

/// Same-context fallback ticker.
///
/// Uses the same deadline arithmetic as the background ticker but only
/// checks when polled, emitting at most one event per elapsed interval.
#[derive(Debug)]
pub struct InlineTicker {
    clock: Arc<dyn Clock>,
    events: UnboundedSender<TickerEvent>,
    active: Option<Countdown>,
    last_reported: Option<u32>,
}

impl InlineTicker {
    pub fn new(clock: Arc<dyn Clock>, events: UnboundedSender<TickerEvent>) -> Self {
        Self {
            clock,
            events,
            active: None,
            last_reported: None,
        }
    }
}

impl Ticker for InlineTicker {
    fn start(&mut self, generation: u64, duration_secs: u32) {
        self.active = Some(Countdown::start(generation, duration_secs, self.clock.now_ms()));
        self.last_reported = Some(duration_secs);
    }

    fn stop(&mut self) {
        self.active = None;
        self.last_reported = None;
    }

    fn poll(&mut self) {
        let Some(countdown) = self.active else {
            return;
        };
        let event = countdown.check(self.clock.now_ms());
        match event.kind {
            TickKind::Complete => {
                self.active = None;
                self.last_reported = None;
            }
            TickKind::Tick { remaining_secs } => {
                // Report only when a whole second has gone by.
                if self.last_reported == Some(remaining_secs) {
                    return;
                }
                self.last_reported = Some(remaining_secs);
            }
        }
        if self.events.send(event).is_err() {
            debug!(?event, "ticker receiver is gone, event dropped");
        }
    }

    fn is_background(&self) -> bool {
        false
    }
}
