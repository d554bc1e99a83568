//! Append-only session ledger.
//!
//! Holds the session, skipped-session and distraction logs. Rows are only
//! appended or completed in place; nothing is ever removed.

use chrono::{DateTime, NaiveDate, Utc};

use super::log::{
    DistractionLog, SessionAnnotations, SessionId, SessionLog, SkipReason, SkippedSessionLog,
};
use crate::timer::Mode;

#[derive(Debug, Clone, Default)]
pub struct SessionLedger {
    sessions: Vec<SessionLog>,
    skipped: Vec<SkippedSessionLog>,
    distractions: Vec<DistractionLog>,
    last_id: i64,
}

impl SessionLedger {
    pub fn new(
        sessions: Vec<SessionLog>,
        skipped: Vec<SkippedSessionLog>,
        distractions: Vec<DistractionLog>,
    ) -> Self {
        let last_id = sessions
            .iter()
            .map(|s| s.id)
            .chain(distractions.iter().map(|d| d.id))
            .max()
            .unwrap_or(0);
        Self {
            sessions,
            skipped,
            distractions,
            last_id,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn sessions(&self) -> &[SessionLog] {
        &self.sessions
    }

    pub fn skipped(&self) -> &[SkippedSessionLog] {
        &self.skipped
    }

    pub fn distractions(&self) -> &[DistractionLog] {
        &self.distractions
    }

    pub fn get(&self, id: SessionId) -> Option<&SessionLog> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Completed Work sessions dated `date`.
    pub fn completed_work_on(&self, date: NaiveDate) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.date == date && s.is_completed_work())
            .count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append an in-progress log for a timer that just started running.
    ///
    /// `task_id` is only recorded for Work sessions.
    pub fn start_session(
        &mut self,
        mode: Mode,
        task_id: Option<&str>,
        planned_secs: u64,
        now: DateTime<Utc>,
    ) -> SessionLog {
        let log = SessionLog {
            id: self.next_id(now),
            date: now.date_naive(),
            mode,
            duration: planned_secs,
            completed: false,
            task_id: if mode == Mode::Work {
                task_id.map(str::to_string)
            } else {
                None
            },
            label: None,
            focus_type: None,
            energy_level: None,
            mood: None,
        };
        tracing::info!(session_id = log.id, mode = %mode, "session started");
        self.sessions.push(log.clone());
        log
    }

    /// Mark a session completed and merge annotations.
    ///
    /// Returns false (and changes nothing) for an unknown id.
    pub fn complete_session(&mut self, id: SessionId, annotations: &SessionAnnotations) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(log) => {
                log.completed = true;
                log.merge(annotations);
                tracing::info!(session_id = id, "session completed");
                true
            }
            None => false,
        }
    }

    /// Merge review annotations into an already completed session.
    pub fn annotate(&mut self, id: SessionId, annotations: &SessionAnnotations) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(log) => {
                log.merge(annotations);
                true
            }
            None => false,
        }
    }

    pub fn record_skip(&mut self, mode: Mode, reason: SkipReason, now: DateTime<Utc>) -> SkippedSessionLog {
        let entry = SkippedSessionLog {
            timestamp: now,
            mode,
            reason,
        };
        tracing::info!(mode = %mode, reason = %reason, "session skipped");
        self.skipped.push(entry.clone());
        entry
    }

    pub fn record_distraction(
        &mut self,
        session_id: Option<SessionId>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DistractionLog {
        let entry = DistractionLog {
            id: self.next_id(now),
            session_id,
            timestamp: now,
            reason,
        };
        self.distractions.push(entry.clone());
        entry
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> i64 {
        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn start_creates_in_progress_row() {
        let mut ledger = SessionLedger::default();
        let log = ledger.start_session(Mode::Work, Some("t1"), 1500, at(9, 0));
        assert!(!log.completed);
        assert_eq!(log.duration, 1500);
        assert_eq!(log.task_id.as_deref(), Some("t1"));
        assert_eq!(ledger.sessions().len(), 1);
    }

    #[test]
    fn break_sessions_drop_task_id() {
        let mut ledger = SessionLedger::default();
        let log = ledger.start_session(Mode::ShortBreak, Some("t1"), 300, at(9, 0));
        assert!(log.task_id.is_none());
    }

    #[test]
    fn ids_are_monotonic_within_same_instant() {
        let mut ledger = SessionLedger::default();
        let a = ledger.start_session(Mode::Work, None, 1500, at(9, 0));
        let b = ledger.start_session(Mode::Work, None, 1500, at(9, 0));
        let d = ledger.record_distraction(Some(b.id), None, at(9, 0));
        assert!(b.id > a.id);
        assert!(d.id > b.id);
    }

    #[test]
    fn complete_and_count_today() {
        let mut ledger = SessionLedger::default();
        let a = ledger.start_session(Mode::Work, None, 1500, at(9, 0));
        let _abandoned = ledger.start_session(Mode::Work, None, 1500, at(10, 0));
        let brk = ledger.start_session(Mode::ShortBreak, None, 300, at(11, 0));
        assert!(ledger.complete_session(a.id, &SessionAnnotations::default()));
        assert!(ledger.complete_session(brk.id, &SessionAnnotations::default()));
        assert_eq!(ledger.completed_work_on(at(9, 0).date_naive()), 1);
        assert_eq!(ledger.completed_work_on(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()), 0);
    }

    #[test]
    fn complete_unknown_is_noop() {
        let mut ledger = SessionLedger::default();
        assert!(!ledger.complete_session(42, &SessionAnnotations::default()));
        assert!(ledger.sessions().is_empty());
    }

    #[test]
    fn new_resumes_id_sequence() {
        let mut first = SessionLedger::default();
        let log = first.start_session(Mode::Work, None, 1500, at(12, 0));
        let mut reopened = SessionLedger::new(first.sessions().to_vec(), vec![], vec![]);
        let next = reopened.start_session(Mode::Work, None, 1500, at(8, 0));
        assert!(next.id > log.id);
    }
}
