use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Mode;
use crate::session::SessionId;

/// Snapshots older than this are discarded on load.
pub const RESUME_WINDOW_SECS: i64 = 5 * 60;

/// Live timer state saved on suspend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSession {
    pub mode: Mode,
    pub seconds_left: u64,
    pub is_active: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pomodoros_in_cycle: u32,
    /// In-progress ledger row the resumed run continues.
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

/// Where the timer rests between runs. Unlike [`LastSession`] it never
/// goes stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPosition {
    pub mode: Mode,
    pub seconds_left: u64,
    pub pomodoros_in_cycle: u32,
}

impl LastSession {
    /// True while the snapshot is recent enough to resume from.
    ///
    /// A timestamp in the future counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < Duration::seconds(RESUME_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn saved_at(ts: DateTime<Utc>) -> LastSession {
        LastSession {
            mode: Mode::Work,
            seconds_left: 600,
            is_active: true,
            timestamp: ts,
            pomodoros_in_cycle: 1,
            session_id: Some(1_714_554_000_000),
        }
    }

    #[test]
    fn freshness_threshold() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let snap = saved_at(ts);
        assert!(snap.is_fresh(ts + Duration::minutes(2)));
        assert!(snap.is_fresh(ts + Duration::seconds(299)));
        assert!(!snap.is_fresh(ts + Duration::minutes(5)));
        assert!(!snap.is_fresh(ts + Duration::minutes(6)));
    }

    #[test]
    fn legacy_snapshot_without_cycle_loads() {
        let json = r#"{"mode":"Short Break","secondsLeft":120,"isActive":false,"timestamp":"2024-05-01T09:00:00Z"}"#;
        let snap: LastSession = serde_json::from_str(json).unwrap();
        assert_eq!(snap.mode, Mode::ShortBreak);
        assert_eq!(snap.pomodoros_in_cycle, 0);
        assert!(snap.session_id.is_none());
    }
}
