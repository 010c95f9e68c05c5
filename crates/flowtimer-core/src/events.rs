use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every engine transition a subscriber may care about.
/// The CLI prints these; presenters subscribe to them through
/// [`EventSink`](crate::timer::EventSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        step_index: usize,
        repetition: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        restarted: bool,
        at: DateTime<Utc>,
    },
    StepChanged {
        step_index: usize,
        repetition: u32,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        /// The repetition that just finished.
        completed_repetition: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        definition_id: String,
        step_index: usize,
        step_name: String,
        repetition: u32,
        remaining_secs: u32,
        is_running: bool,
        progress_ratio: f64,
        at: DateTime<Utc>,
    },
}
