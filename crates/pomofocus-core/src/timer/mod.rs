//! Countdown timer: modes, durations and the session state machine.

mod engine;
mod mode;
mod snapshot;

pub use engine::{TimerContext, TimerEngine, TimerPhase};
pub use mode::{format_clock, Mode};
pub use snapshot::{LastSession, TimerPosition, RESUME_WINDOW_SECS};
