use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{SessionId, SkipReason};
use crate::timer::{Mode, TimerPhase};

/// Every state change in the system produces an Event.
/// Front ends render them; the notifier reacts to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        seconds_left: u64,
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: Mode,
        to: Mode,
        seconds_left: u64,
        auto_start: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the alarm plays on this event.
    TimerCompleted {
        mode: Mode,
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
    /// Fired once, when today's completed Work count hits the daily goal.
    DailyGoalReached {
        completed_today: usize,
        goal: u32,
        at: DateTime<Utc>,
    },
    /// A Work session finished; the timer waits for the review to resolve.
    ReviewRequested {
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
    ReviewResolved {
        session_id: Option<SessionId>,
        pomodoros_in_cycle: u32,
        task_id: Option<String>,
        task_completed: bool,
        next_mode: Mode,
        at: DateTime<Utc>,
    },
    SessionSkipped {
        mode: Mode,
        reason: SkipReason,
        at: DateTime<Utc>,
    },
    /// Live state recovered from a recent snapshot.
    SessionRestored {
        mode: Mode,
        seconds_left: u64,
        is_active: bool,
        at: DateTime<Utc>,
    },
    /// Every task on the board is done; prompt for the end-of-day review.
    DailyReviewRequested {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    DistractionLogged {
        id: i64,
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
    /// Transient user-facing message, e.g. a collaborator failure.
    Notice {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        phase: TimerPhase,
        seconds_left: u64,
        total_secs: u64,
        pomodoros_in_cycle: u32,
        session_id: Option<SessionId>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn notice(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Event::Notice {
            message: message.into(),
            at,
        }
    }
}
