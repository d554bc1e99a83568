pub mod config;
pub mod journal;
pub mod stats;
pub mod task;
pub mod template;
pub mod timer;

use pomofocus_core::{Event, Pomofocus};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Surface user-facing events on stderr so stdout stays machine-readable.
pub fn report_events(app: &mut Pomofocus) {
    for event in app.take_events() {
        match event {
            Event::Notice { message, .. } => eprintln!("{message}"),
            Event::DailyReviewRequested { date, .. } => {
                eprintln!("All tasks done for {date}. Record how it went with `pomofocus review`.")
            }
            Event::DailyGoalReached { goal, .. } => eprintln!("Daily goal of {goal} pomodoros reached!"),
            other => tracing::debug!(event = ?other, "event"),
        }
    }
}
