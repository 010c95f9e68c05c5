mod clock;
mod definition;
mod effects;
mod engine;
pub mod presets;
pub mod progress;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use definition::{Repetitions, TimerDefinition, TimerStep};
pub use effects::{Effect, EffectHandler, EffectRecorder, EffectSlot, EventSink};
pub use engine::{RunState, Snapshot, TimerEngine, TimerState};
pub use progress::Position;
pub use ticker::{
    BackgroundTicker, Countdown, InlineTicker, TickKind, Ticker, TickerCommand, TickerEvent,
    TickerOptions,
};
