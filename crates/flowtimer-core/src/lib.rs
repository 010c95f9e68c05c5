//! # flowtimer Core Library
//!
//! Interval timer engine for breathwork, meditation, yoga and workout
//! timers. A timer is an ordered cycle of timed steps repeated a fixed or
//! infinite number of times.
//!
//! ## Architecture
//!
//! - **Ticker**: counts the current step down against an absolute deadline
//!   on its own tokio task, so a stalled or throttled owner never makes the
//!   timer drift. Falls back to an owner-polled ticker without a runtime.
//! - **Timer Engine**: step/repetition state machine driven by ticker events
//!   and user commands (start, pause, reset, next, previous, jump)
//! - **Progress**: pure functions deriving progress figures for rendering
//! - **Effects**: step-change, cycle-complete and completion notifications
//!   delivered to a replaceable handler
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDefinition`]: Validated description of a timer
//! - [`EffectHandler`]: Receiver of engine notifications
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use storage::Config;
pub use timer::{
    Effect, EffectHandler, EffectRecorder, EventSink, Repetitions, RunState, Snapshot,
    TimerDefinition, TimerEngine, TimerState, TimerStep,
};
