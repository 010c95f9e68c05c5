//! Outbound notifications fired by engine transitions.
//!
//! Handlers are fire-and-forget. The engine never waits on them, and a
//! handler that panics is logged and otherwise ignored so that a failed
//! sound or speech cue cannot stop a running timer.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::events::Event;

/// A single effect, as fired by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    StepChanged { step_index: usize, repetition: u32 },
    CycleCompleted,
    Completed,
}

/// Receiver of engine effects (audio, speech, notifications, UI).
pub trait EffectHandler: Send {
    fn on_step_change(&mut self, _step_index: usize, _repetition: u32) {}
    fn on_cycle_complete(&mut self) {}
    fn on_complete(&mut self) {}
}

/// Replaceable handler slot owned by the engine.
///
/// The presenter swaps the handler whenever its callbacks change; the engine
/// always dispatches to whatever is installed at the moment of the
/// transition.
#[derive(Default)]
pub struct EffectSlot {
    handler: Option<Box<dyn EffectHandler>>,
}

impl EffectSlot {
    pub fn new(handler: Box<dyn EffectHandler>) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn replace(&mut self, handler: Box<dyn EffectHandler>) -> Option<Box<dyn EffectHandler>> {
        self.handler.replace(handler)
    }

    pub fn clear(&mut self) -> Option<Box<dyn EffectHandler>> {
        self.handler.take()
    }

    pub fn is_empty(&self) -> bool {
        self.handler.is_none()
    }

    pub fn fire(&mut self, effect: Effect) {
        let Some(handler) = self.handler.as_mut() else {
            return;
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| match effect {
            Effect::StepChanged {
                step_index,
                repetition,
            } => handler.on_step_change(step_index, repetition),
            Effect::CycleCompleted => handler.on_cycle_complete(),
            Effect::Completed => handler.on_complete(),
        }));
        if outcome.is_err() {
            warn!(?effect, "effect handler panicked, continuing");
        }
    }
}

impl std::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("installed", &self.handler.is_some())
            .finish()
    }
}

/// Keeps every effect it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EffectRecorder {
    log: Arc<Mutex<Vec<Effect>>>,
}

impl EffectRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, effect: Effect) {
        if let Ok(mut log) = self.log.lock() {
            log.push(effect);
        }
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn count(&self, matches: impl Fn(&Effect) -> bool) -> usize {
        self.effects().iter().filter(|e| matches(e)).count()
    }
}

impl EffectHandler for EffectRecorder {
    fn on_step_change(&mut self, step_index: usize, repetition: u32) {
        self.push(Effect::StepChanged {
            step_index,
            repetition,
        });
    }

    fn on_cycle_complete(&mut self) {
        self.push(Effect::CycleCompleted);
    }

    fn on_complete(&mut self) {
        self.push(Effect::Completed);
    }
}

/// Forwards effects as [`Event`]s to a subscriber over a channel.
///
/// A closed channel is not an error; the subscriber simply went away.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<Event>,
    repetition: u32,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx, repetition: 1 }
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl EffectHandler for EventSink {
    fn on_step_change(&mut self, step_index: usize, repetition: u32) {
        self.repetition = repetition;
        self.send(Event::StepChanged {
            step_index,
            repetition,
            at: Utc::now(),
        });
    }

    fn on_cycle_complete(&mut self) {
        self.send(Event::CycleCompleted {
            completed_repetition: self.repetition,
            at: Utc::now(),
        });
    }

    fn on_complete(&mut self) {
        self.repetition = 1;
        self.send(Event::TimerCompleted { at: Utc::now() });
    }
}
