//! Step/repetition state machine.
//!
//! The engine owns the run position of one timer and a ticker that counts
//! the current step down. Commands mutate the run synchronously; ticker
//! events arrive asynchronously and are applied by [`TimerEngine::pump`] or
//! [`TimerEngine::wait_event`].
//!
//! ## State Transitions
//!
//! ```text
//! Stopped --start--> Running --pause--> Stopped
//! Running --last step of last repetition completes--> Stopped (rewound)
//! ```
//!
//! Every ticker start or stop bumps a generation counter. Events are tagged
//! with the generation that started them, so an event emitted before a
//! reset, jump or pause can never be applied afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::bind(definition)?;
//! engine.set_effects(Box::new(cues));
//! engine.start();
//! while engine.wait_event().await.is_some() {
//!     render(engine.snapshot());
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::definition::{TimerDefinition, TimerStep};
use super::effects::{Effect, EffectHandler, EffectSlot};
use super::progress::{self, Position};
use super::ticker::{self, TickKind, Ticker, TickerEvent, TickerOptions};
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Stopped,
    Running,
}

/// Mutable position of a run. Owned by exactly one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub step_index: usize,
    /// 1-based.
    pub repetition: u32,
    pub remaining_secs: u32,
    pub is_running: bool,
}

impl RunState {
    fn initial(definition: &TimerDefinition) -> Self {
        Self {
            step_index: 0,
            repetition: 1,
            remaining_secs: definition.duration_of(0),
            is_running: false,
        }
    }

    fn position(&self) -> Position {
        Position {
            step_index: self.step_index,
            repetition: self.repetition,
            remaining_secs: self.remaining_secs,
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub remaining_secs: u32,
    pub step_index: usize,
    pub repetition: u32,
    pub is_running: bool,
    pub progress_ratio: f64,
}

/// Interval timer engine for one timer definition.
#[derive(Debug)]
pub struct TimerEngine {
    definition: TimerDefinition,
    run: RunState,
    generation: u64,
    ticker: Box<dyn Ticker>,
    ticker_events: UnboundedReceiver<TickerEvent>,
    effects: EffectSlot,
}

impl TimerEngine {
    /// Validate `definition` and attach it to a fresh engine with a
    /// default ticker.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the definition is unusable; no
    /// engine is created in that case.
    pub fn bind(definition: TimerDefinition) -> Result<Self, ValidationError> {
        Self::bind_with(definition, TickerOptions::default())
    }

    /// Like [`bind`](Self::bind) with explicit ticker settings.
    pub fn bind_with(
        definition: TimerDefinition,
        options: TickerOptions,
    ) -> Result<Self, ValidationError> {
        definition.validate()?;
        let (ticker, ticker_events) = ticker::spawn(options);
        Ok(Self::assemble(definition, ticker, ticker_events))
    }

    /// Attach `definition` to a caller-supplied ticker and its event stream.
    pub fn with_ticker(
        definition: TimerDefinition,
        ticker: Box<dyn Ticker>,
        ticker_events: UnboundedReceiver<TickerEvent>,
    ) -> Result<Self, ValidationError> {
        definition.validate()?;
        Ok(Self::assemble(definition, ticker, ticker_events))
    }

    fn assemble(
        definition: TimerDefinition,
        ticker: Box<dyn Ticker>,
        ticker_events: UnboundedReceiver<TickerEvent>,
    ) -> Self {
        let run = RunState::initial(&definition);
        debug!(definition = %definition.id, steps = definition.step_count(), "timer bound");
        Self {
            definition,
            run,
            generation: 0,
            ticker,
            ticker_events,
            effects: EffectSlot::default(),
        }
    }

    /// Replace the definition. Any run in progress is stopped and the run
    /// state starts over; the current definition is kept when validation
    /// fails.
    pub fn bind_definition(&mut self, definition: TimerDefinition) -> Result<(), ValidationError> {
        definition.validate()?;
        self.stop_ticker();
        self.run = RunState::initial(&definition);
        self.definition = definition;
        debug!(definition = %self.definition.id, "timer rebound");
        Ok(())
    }

    /// Install the handler that receives effects from now on.
    pub fn set_effects(&mut self, handler: Box<dyn EffectHandler>) {
        self.effects.replace(handler);
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn definition(&self) -> &TimerDefinition {
        &self.definition
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn state(&self) -> TimerState {
        if self.run.is_running {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_running
    }

    pub fn step_index(&self) -> usize {
        self.run.step_index
    }

    pub fn repetition(&self) -> u32 {
        self.run.repetition
    }

    pub fn remaining_secs(&self) -> u32 {
        self.run.remaining_secs
    }

    /// Generation of the most recent ticker start or stop.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_step(&self) -> Option<&TimerStep> {
        self.definition.step(self.run.step_index)
    }

    pub fn has_background_ticker(&self) -> bool {
        self.ticker.is_background()
    }

    pub fn progress_ratio(&self) -> f64 {
        progress::progress_ratio(
            &self.definition.steps,
            self.definition.repetitions,
            self.run.position(),
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            remaining_secs: self.run.remaining_secs,
            step_index: self.run.step_index,
            repetition: self.run.repetition,
            is_running: self.run.is_running,
            progress_ratio: self.progress_ratio(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            definition_id: self.definition.id.clone(),
            step_index: self.run.step_index,
            step_name: self.current_step().map(|s| s.name.clone()).unwrap_or_default(),
            repetition: self.run.repetition,
            remaining_secs: self.run.remaining_secs,
            is_running: self.run.is_running,
            progress_ratio: self.progress_ratio(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume counting from the current remaining time.
    pub fn start(&mut self) -> Option<Event> {
        if self.run.is_running {
            return None;
        }
        self.run.is_running = true;
        self.start_ticker(self.run.remaining_secs);
        info!(
            definition = %self.definition.id,
            step = self.run.step_index,
            repetition = self.run.repetition,
            remaining = self.run.remaining_secs,
            "timer started"
        );
        Some(Event::TimerStarted {
            step_index: self.run.step_index,
            repetition: self.run.repetition,
            remaining_secs: self.run.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop counting, keeping the remaining time for a later `start`.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.run.is_running {
            return None;
        }
        self.run.is_running = false;
        self.stop_ticker();
        debug!(remaining = self.run.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.run.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Rewind to the first step of the first repetition.
    ///
    /// With `restart`, a running timer keeps running from the top.
    /// Otherwise the timer ends up stopped.
    pub fn reset(&mut self, restart: bool) -> Option<Event> {
        let keep_running = restart && self.run.is_running;
        self.run = RunState::initial(&self.definition);
        if keep_running {
            self.run.is_running = true;
            self.start_ticker(self.run.remaining_secs);
        } else {
            self.stop_ticker();
        }
        debug!(restarted = keep_running, "timer reset");
        Some(Event::TimerReset {
            restarted: keep_running,
            at: Utc::now(),
        })
    }

    /// Move one step forward within the current cycle. Does nothing on the
    /// last step; manual stepping never crosses a repetition boundary.
    pub fn next_step(&mut self) -> Option<Event> {
        if self.run.step_index >= self.definition.last_index() {
            return None;
        }
        self.move_to(self.run.step_index + 1)
    }

    /// Move one step back within the current cycle. Does nothing on the
    /// first step.
    pub fn prev_step(&mut self) -> Option<Event> {
        if self.run.step_index == 0 {
            return None;
        }
        self.move_to(self.run.step_index - 1)
    }

    /// Jump to `index` in the current repetition. Out-of-range indices are
    /// ignored.
    pub fn jump_to_step(&mut self, index: usize) -> Option<Event> {
        if index >= self.definition.step_count() {
            debug!(index, "jump out of range ignored");
            return None;
        }
        self.move_to(index)
    }

    fn move_to(&mut self, index: usize) -> Option<Event> {
        self.run.step_index = index;
        self.run.remaining_secs = self.definition.duration_of(index);
        if self.run.is_running {
            self.start_ticker(self.run.remaining_secs);
        }
        self.fire_step_change();
        Some(Event::StepChanged {
            step_index: index,
            repetition: self.run.repetition,
            at: Utc::now(),
        })
    }

    // ── Ticker events ────────────────────────────────────────────────

    /// Apply one ticker event. Returns `false` when the event was stale and
    /// dropped.
    pub fn handle_event(&mut self, event: TickerEvent) -> bool {
        if event.generation != self.generation || !self.run.is_running {
            debug!(
                event_generation = event.generation,
                current = self.generation,
                "stale ticker event dropped"
            );
            return false;
        }
        match event.kind {
            TickKind::Tick { remaining_secs } => {
                let duration = self.definition.duration_of(self.run.step_index);
                self.run.remaining_secs = remaining_secs.min(duration);
            }
            TickKind::Complete => self.advance(),
        }
        true
    }

    /// Poll the ticker and apply every event already delivered, without
    /// waiting. Returns how many events were applied.
    pub fn pump(&mut self) -> usize {
        self.ticker.poll();
        let mut applied = 0;
        while let Ok(event) = self.ticker_events.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next ticker event and apply it.
    ///
    /// Meant for background tickers; an inline ticker only produces events
    /// when polled, so its owner should call [`pump`](Self::pump) instead.
    /// Returns `None` once the ticker has shut down.
    pub async fn wait_event(&mut self) -> Option<TickerEvent> {
        self.ticker.poll();
        let event = self.ticker_events.recv().await?;
        self.handle_event(event);
        Some(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self) {
        let last = self.definition.last_index();
        if self.run.step_index < last {
            self.run.step_index += 1;
            self.run.remaining_secs = self.definition.duration_of(self.run.step_index);
            self.start_ticker(self.run.remaining_secs);
            debug!(step = self.run.step_index, "step advanced");
            self.fire_step_change();
        } else if self.definition.repetitions.has_more_after(self.run.repetition) {
            self.run.repetition = self.run.repetition.saturating_add(1);
            self.run.step_index = 0;
            self.run.remaining_secs = self.definition.duration_of(0);
            self.start_ticker(self.run.remaining_secs);
            debug!(repetition = self.run.repetition, "cycle completed");
            self.effects.fire(Effect::CycleCompleted);
            self.fire_step_change();
        } else {
            self.stop_ticker();
            self.run = RunState::initial(&self.definition);
            info!(definition = %self.definition.id, "timer finished");
            self.effects.fire(Effect::Completed);
        }
    }

    fn fire_step_change(&mut self) {
        self.effects.fire(Effect::StepChanged {
            step_index: self.run.step_index,
            repetition: self.run.repetition,
        });
    }

    fn start_ticker(&mut self, duration_secs: u32) {
        self.generation += 1;
        self.ticker.start(self.generation, duration_secs);
    }

    fn stop_ticker(&mut self) {
        self.generation += 1;
        self.ticker.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc;

    use super::*;
    use crate::timer::definition::Repetitions;
    use crate::timer::effects::EffectRecorder;
    use crate::timer::ticker::TickerCommand;

    /// Ticker double that records the commands it receives.
    #[derive(Debug, Clone, Default)]
    struct ScriptedTicker {
        commands: Arc<Mutex<Vec<TickerCommand>>>,
    }

    impl ScriptedTicker {
        fn last(&self) -> Option<TickerCommand> {
            self.commands.lock().unwrap().last().copied()
        }
    }

    impl Ticker for ScriptedTicker {
        fn start(&mut self, generation: u64, duration_secs: u32) {
            self.commands.lock().unwrap().push(TickerCommand::Start {
                generation,
                duration_secs,
            });
        }

        fn stop(&mut self) {
            self.commands.lock().unwrap().push(TickerCommand::Stop);
        }

        fn is_background(&self) -> bool {
            true
        }
    }

    struct Harness {
        engine: TimerEngine,
        ticker: ScriptedTicker,
        effects: EffectRecorder,
    }

    impl Harness {
        fn new(durations: &[u32], repetitions: Repetitions) -> Self {
            let steps = durations
                .iter()
                .enumerate()
                .map(|(i, d)| TimerStep::new(format!("Step {i}"), *d))
                .collect();
            let definition = TimerDefinition::new("Test", steps, repetitions);
            let ticker = ScriptedTicker::default();
            let (_tx, rx) = mpsc::unbounded_channel();
            let mut engine =
                TimerEngine::with_ticker(definition, Box::new(ticker.clone()), rx).unwrap();
            let effects = EffectRecorder::new();
            engine.set_effects(Box::new(effects.clone()));
            Self {
                engine,
                ticker,
                effects,
            }
        }

        fn tick(&mut self, remaining_secs: u32) -> bool {
            let generation = self.engine.generation();
            self.engine.handle_event(TickerEvent {
                generation,
                kind: TickKind::Tick { remaining_secs },
            })
        }

        fn complete(&mut self) -> bool {
            let generation = self.engine.generation();
            self.engine.handle_event(TickerEvent {
                generation,
                kind: TickKind::Complete,
            })
        }

        fn position(&self) -> (usize, u32) {
            (self.engine.step_index(), self.engine.repetition())
        }
    }

    fn cycles(effects: &EffectRecorder) -> usize {
        effects.count(|e| *e == Effect::CycleCompleted)
    }

    fn completions(effects: &EffectRecorder) -> usize {
        effects.count(|e| *e == Effect::Completed)
    }

    #[test]
    fn starts_stopped_at_first_step() {
        let h = Harness::new(&[5, 3], Repetitions::Count(2));
        assert_eq!(
            h.engine.run_state(),
            RunState {
                step_index: 0,
                repetition: 1,
                remaining_secs: 5,
                is_running: false
            }
        );
        assert_eq!(h.engine.state(), TimerState::Stopped);
        assert!(h.ticker.last().is_none());
    }

    #[test]
    fn bind_rejects_invalid_definition() {
        let definition = TimerDefinition::new("Empty", Vec::new(), Repetitions::Count(1));
        let (_tx, rx) = mpsc::unbounded_channel();
        let result = TimerEngine::with_ticker(definition, Box::new(ScriptedTicker::default()), rx);
        assert!(matches!(result, Err(ValidationError::EmptySteps { .. })));
    }

    #[test]
    fn start_pause_resume_keeps_remaining() {
        let mut h = Harness::new(&[10], Repetitions::Count(1));
        assert!(h.engine.start().is_some());
        assert!(h.engine.start().is_none(), "already running");
        assert_eq!(
            h.ticker.last(),
            Some(TickerCommand::Start {
                generation: 1,
                duration_secs: 10
            })
        );

        h.tick(6);
        assert!(h.engine.pause().is_some());
        assert_eq!(h.ticker.last(), Some(TickerCommand::Stop));
        assert_eq!(h.engine.remaining_secs(), 6);
        assert!(h.engine.pause().is_none());

        h.engine.start();
        assert_eq!(
            h.ticker.last(),
            Some(TickerCommand::Start {
                generation: 3,
                duration_secs: 6
            })
        );
    }

    #[test]
    fn tick_updates_remaining_without_transition() {
        let mut h = Harness::new(&[5, 5], Repetitions::Count(1));
        h.engine.start();
        assert!(h.tick(3));
        assert_eq!(h.engine.remaining_secs(), 3);
        assert_eq!(h.position(), (0, 1));
        assert!(h.effects.effects().is_empty());
    }

    #[test]
    fn tick_is_clamped_to_step_duration() {
        let mut h = Harness::new(&[5], Repetitions::Count(1));
        h.engine.start();
        h.tick(99);
        assert_eq!(h.engine.remaining_secs(), 5);
    }

    #[test]
    fn advance_rule_two_steps_two_repetitions() {
        let mut h = Harness::new(&[4, 6], Repetitions::Count(2));
        h.engine.start();

        h.complete();
        assert_eq!(h.position(), (1, 1));
        assert_eq!(h.engine.remaining_secs(), 6);
        assert_eq!(cycles(&h.effects), 0);

        h.complete();
        assert_eq!(h.position(), (0, 2));
        assert_eq!(cycles(&h.effects), 1);

        h.complete();
        assert_eq!(h.position(), (1, 2));

        h.complete();
        assert_eq!(
            h.engine.run_state(),
            RunState {
                step_index: 0,
                repetition: 1,
                remaining_secs: 4,
                is_running: false
            }
        );
        assert_eq!(h.ticker.last(), Some(TickerCommand::Stop));
        assert_eq!(cycles(&h.effects), 1);
        assert_eq!(completions(&h.effects), 1);

        assert_eq!(
            h.effects.effects(),
            vec![
                Effect::StepChanged {
                    step_index: 1,
                    repetition: 1
                },
                Effect::CycleCompleted,
                Effect::StepChanged {
                    step_index: 0,
                    repetition: 2
                },
                Effect::StepChanged {
                    step_index: 1,
                    repetition: 2
                },
                Effect::Completed,
            ]
        );
    }

    #[test]
    fn advance_restarts_ticker_with_next_duration() {
        let mut h = Harness::new(&[4, 6], Repetitions::Count(2));
        h.engine.start();
        h.complete();
        assert_eq!(
            h.ticker.last(),
            Some(TickerCommand::Start {
                generation: 2,
                duration_secs: 6
            })
        );
    }

    #[test]
    fn single_step_goes_straight_to_repetition_check() {
        let mut h = Harness::new(&[30], Repetitions::Count(3));
        h.engine.start();
        h.complete();
        assert_eq!(h.position(), (0, 2));
        h.complete();
        assert_eq!(h.position(), (0, 3));
        h.complete();
        assert!(!h.engine.is_running());
        assert_eq!(h.position(), (0, 1));
        assert_eq!(cycles(&h.effects), 2);
        assert_eq!(completions(&h.effects), 1);
    }

    #[test]
    fn single_repetition_never_fires_cycle_complete() {
        let mut h = Harness::new(&[2, 2, 2], Repetitions::Count(1));
        h.engine.start();
        for _ in 0..3 {
            h.complete();
        }
        assert_eq!(cycles(&h.effects), 0);
        assert_eq!(completions(&h.effects), 1);
        assert!(!h.engine.is_running());
    }

    #[test]
    fn infinite_repetition_never_completes() {
        let mut h = Harness::new(&[4, 4], Repetitions::Infinite);
        h.engine.start();
        for _ in 0..(10 * 2) {
            assert!(h.complete());
        }
        assert_eq!(completions(&h.effects), 0);
        assert_eq!(cycles(&h.effects), 10);
        assert_eq!(h.position(), (0, 11));
        assert!(h.engine.is_running());

        h.engine.pause();
        assert!(!h.engine.is_running());
    }

    #[test]
    fn finished_timer_can_run_again() {
        let mut h = Harness::new(&[1], Repetitions::Count(1));
        h.engine.start();
        h.complete();
        assert_eq!(completions(&h.effects), 1);

        h.engine.start();
        assert!(h.engine.is_running());
        h.complete();
        assert_eq!(completions(&h.effects), 2);
    }

    #[test]
    fn next_and_prev_clamp_without_wrapping() {
        let mut h = Harness::new(&[3, 4, 5], Repetitions::Count(2));
        assert!(h.engine.prev_step().is_none());
        assert_eq!(h.position(), (0, 1));

        h.engine.next_step();
        h.engine.next_step();
        assert_eq!(h.position(), (2, 1));
        assert_eq!(h.engine.remaining_secs(), 5);

        assert!(h.engine.next_step().is_none());
        assert_eq!(h.position(), (2, 1), "no auto-advance into repetition 2");
        assert_eq!(cycles(&h.effects), 0);

        h.engine.prev_step();
        assert_eq!(h.position(), (1, 1));
        assert_eq!(h.engine.remaining_secs(), 4);
    }

    #[test]
    fn manual_steps_do_not_wrap_backwards_across_repetitions() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(3));
        h.engine.start();
        h.complete();
        h.complete();
        assert_eq!(h.position(), (0, 2));
        assert!(h.engine.prev_step().is_none());
        assert_eq!(h.position(), (0, 2));
    }

    #[test]
    fn next_step_while_paused_does_not_start_ticker() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(1));
        h.engine.next_step();
        assert!(h.ticker.last().is_none());
        assert!(!h.engine.is_running());
        assert_eq!(
            h.effects.effects(),
            vec![Effect::StepChanged {
                step_index: 1,
                repetition: 1
            }]
        );
    }

    #[test]
    fn next_step_while_running_restarts_ticker() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(1));
        h.engine.start();
        h.tick(1);
        h.engine.next_step();
        assert_eq!(
            h.ticker.last(),
            Some(TickerCommand::Start {
                generation: 2,
                duration_secs: 4
            })
        );
        assert_eq!(h.engine.remaining_secs(), 4);
    }

    #[test]
    fn jump_validates_index_and_keeps_repetition() {
        let mut h = Harness::new(&[3, 4, 5], Repetitions::Count(3));
        h.engine.start();
        h.complete();
        h.complete();
        h.complete();
        assert_eq!(h.position(), (0, 2));

        assert!(h.engine.jump_to_step(3).is_none());
        assert_eq!(h.position(), (0, 2));

        assert!(h.engine.jump_to_step(2).is_some());
        assert_eq!(h.position(), (2, 2));
        assert_eq!(h.engine.remaining_secs(), 5);
        assert_eq!(
            h.effects.effects().last(),
            Some(&Effect::StepChanged {
                step_index: 2,
                repetition: 2
            })
        );
    }

    #[test]
    fn reset_without_restart_stops() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(3));
        h.engine.start();
        h.complete();
        h.complete();
        h.tick(2);
        h.engine.reset(false);
        assert_eq!(
            h.engine.run_state(),
            RunState {
                step_index: 0,
                repetition: 1,
                remaining_secs: 3,
                is_running: false
            }
        );
        assert_eq!(h.ticker.last(), Some(TickerCommand::Stop));
    }

    #[test]
    fn reset_with_restart_keeps_running_from_first_step() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(3));
        h.engine.start();
        h.complete();
        h.engine.reset(true);
        assert_eq!(
            h.engine.run_state(),
            RunState {
                step_index: 0,
                repetition: 1,
                remaining_secs: 3,
                is_running: true
            }
        );
        assert_eq!(
            h.ticker.last(),
            Some(TickerCommand::Start {
                generation: h.engine.generation(),
                duration_secs: 3
            })
        );
    }

    #[test]
    fn reset_with_restart_while_stopped_stays_stopped() {
        let mut h = Harness::new(&[3, 4], Repetitions::Count(3));
        h.engine.next_step();
        h.engine.reset(true);
        assert!(!h.engine.is_running());
        assert_eq!(h.position(), (0, 1));
    }

    #[test]
    fn stale_events_are_dropped() {
        let mut h = Harness::new(&[5, 5], Repetitions::Count(1));
        h.engine.start();
        let before_reset = h.engine.generation();
        h.engine.reset(true);

        let applied = h.engine.handle_event(TickerEvent {
            generation: before_reset,
            kind: TickKind::Complete,
        });
        assert!(!applied);
        assert_eq!(h.position(), (0, 1));
        assert!(h.effects.effects().is_empty());

        let applied = h.engine.handle_event(TickerEvent {
            generation: before_reset,
            kind: TickKind::Tick { remaining_secs: 1 },
        });
        assert!(!applied);
        assert_eq!(h.engine.remaining_secs(), 5);
    }

    #[test]
    fn events_after_pause_are_dropped() {
        let mut h = Harness::new(&[5], Repetitions::Count(1));
        h.engine.start();
        let running = h.engine.generation();
        h.engine.pause();
        assert!(!h.engine.handle_event(TickerEvent {
            generation: running,
            kind: TickKind::Tick { remaining_secs: 2 },
        }));
        assert_eq!(h.engine.remaining_secs(), 5);
    }

    #[test]
    fn rebinding_starts_a_fresh_run() {
        let mut h = Harness::new(&[5, 5], Repetitions::Count(2));
        h.engine.start();
        h.complete();

        let replacement = TimerDefinition::new(
            "Other",
            vec![TimerStep::new("Only", 9)],
            Repetitions::Infinite,
        );
        h.engine.bind_definition(replacement).unwrap();
        assert_eq!(
            h.engine.run_state(),
            RunState {
                step_index: 0,
                repetition: 1,
                remaining_secs: 9,
                is_running: false
            }
        );
        assert_eq!(h.ticker.last(), Some(TickerCommand::Stop));

        let broken = TimerDefinition::new("Broken", Vec::new(), Repetitions::Count(1));
        assert!(h.engine.bind_definition(broken).is_err());
        assert_eq!(h.engine.definition().name, "Other");
    }

    #[test]
    fn effects_go_to_the_current_handler() {
        let mut h = Harness::new(&[1, 1], Repetitions::Count(1));
        h.engine.start();
        h.complete();

        let later = EffectRecorder::new();
        h.engine.set_effects(Box::new(later.clone()));
        h.complete();

        assert_eq!(h.effects.effects().len(), 1);
        assert_eq!(later.effects(), vec![Effect::Completed]);
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut h = Harness::new(&[4, 4], Repetitions::Count(2));
        h.engine.start();
        h.complete();
        h.tick(2);
        let snap = h.engine.snapshot();
        assert_eq!(snap.step_index, 1);
        assert_eq!(snap.remaining_secs, 2);
        assert!(snap.is_running);
        assert!((snap.progress_ratio - 6.0 / 16.0).abs() < 1e-9);

        match h.engine.snapshot_event() {
            Event::StateSnapshot {
                step_name,
                repetition,
                ..
            } => {
                assert_eq!(step_name, "Step 1");
                assert_eq!(repetition, 1);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
