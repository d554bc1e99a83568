//! Finish-time projection for today's remaining work.
//!
//! Pure computation over the task list and settings: no state, no I/O.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Settings;
use crate::task::{ScheduleDate, Task};
use crate::timer::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishEstimate {
    pub pomos_left: u64,
    pub work_secs: u64,
    pub short_breaks: u64,
    pub long_breaks: u64,
    pub break_secs: u64,
    pub finish_at: DateTime<Utc>,
}

impl FinishEstimate {
    pub fn total_secs(&self) -> u64 {
        self.work_secs.saturating_add(self.break_secs)
    }
}

/// Pomodoros still needed by incomplete Today tasks.
pub fn pomos_left(tasks: &[Task]) -> u64 {
    tasks
        .iter()
        .filter(|t| t.schedule_date == ScheduleDate::Today && !t.is_completed)
        .fold(0u64, |sum, t| sum.saturating_add(u64::from(t.pomos_left())))
}

/// Project when today's remaining pomodoros will be done if started `now`.
///
/// One break separates each pair of Work sessions and none follows the
/// last; every `long_break_interval`-th break is long. Returns `None` when
/// nothing is left. Sums saturate and a finish time past the calendar's end
/// is pinned to the latest representable instant.
pub fn estimate_finish(tasks: &[Task], settings: &Settings, now: DateTime<Utc>) -> Option<FinishEstimate> {
    let pomos_left = pomos_left(tasks);
    if pomos_left == 0 {
        return None;
    }
    let breaks = pomos_left - 1;
    let long_breaks = breaks / u64::from(settings.cycle_length());
    let short_breaks = breaks - long_breaks;

    let work_secs = pomos_left.saturating_mul(Mode::Work.duration_secs(settings));
    let break_secs = short_breaks
        .saturating_mul(Mode::ShortBreak.duration_secs(settings))
        .saturating_add(long_breaks.saturating_mul(Mode::LongBreak.duration_secs(settings)));
    let finish_at = i64::try_from(work_secs.saturating_add(break_secs))
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|total| now.checked_add_signed(total))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Some(FinishEstimate {
        pomos_left,
        work_secs,
        short_breaks,
        long_breaks,
        break_secs,
        finish_at,
    })
}
