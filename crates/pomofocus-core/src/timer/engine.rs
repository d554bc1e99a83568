//! Timer state machine.
//!
//! The engine owns the mode, the countdown, the run phase and the position in
//! the pomodoro cycle. It has no thread of its own: the caller invokes
//! [`TimerEngine::tick`] once per elapsed second while the timer runs.
//!
//! ## Phases
//!
//! ```text
//! Idle <-> Running --(countdown hits zero, Work)--> AwaitingReview --> Idle | Running
//!             \--(countdown hits zero, break)--> Work (Idle | Running)
//! ```
//!
//! While `AwaitingReview` the countdown cannot tick and no mode change is
//! accepted until [`TimerEngine::continue_after_review`] resolves the gate.
//!
//! Every command takes a [`TimerContext`] carrying the settings, the session
//! ledger, the task board and the current instant, and returns the events it
//! produced. Rejected commands return no events and change nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mode::Mode;
use super::snapshot::{LastSession, TimerPosition};
use crate::events::Event;
use crate::session::{SessionAnnotations, SessionId, SessionLedger, SkipReason};
use crate::storage::Settings;
use crate::task::TaskBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
    /// A Work session finished and the post-session review is unresolved.
    AwaitingReview,
}

/// Everything a transition may read or mutate besides the engine itself.
pub struct TimerContext<'a> {
    pub settings: &'a Settings,
    pub ledger: &'a mut SessionLedger,
    pub board: &'a mut TaskBoard,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    mode: Mode,
    seconds_left: u64,
    phase: TimerPhase,
    pomodoros_in_cycle: u32,
    /// In-progress ledger row; only set while Running.
    current_session: Option<SessionId>,
    /// Completed Work row awaiting its review annotations.
    review_session: Option<SessionId>,
}

impl TimerEngine {
    /// Fresh idle Work timer.
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: Mode::Work,
            seconds_left: Mode::Work.duration_secs(settings),
            phase: TimerPhase::Idle,
            pomodoros_in_cycle: 0,
            current_session: None,
            review_session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_awaiting_review(&self) -> bool {
        self.phase == TimerPhase::AwaitingReview
    }

    pub fn pomodoros_in_cycle(&self) -> u32 {
        self.pomodoros_in_cycle
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current_session
    }

    pub fn review_session(&self) -> Option<SessionId> {
        self.review_session
    }

    /// Full state snapshot event.
    pub fn snapshot_event(&self, settings: &Settings, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            phase: self.phase,
            seconds_left: self.seconds_left,
            total_secs: self.mode.duration_secs(settings),
            pomodoros_in_cycle: self.pomodoros_in_cycle,
            session_id: self.current_session.or(self.review_session),
            at: now,
        }
    }

    /// State to persist on suspend. Only a running timer is worth resuming.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<LastSession> {
        self.is_active().then(|| LastSession {
            mode: self.mode,
            seconds_left: self.seconds_left,
            is_active: true,
            timestamp: now,
            pomodoros_in_cycle: self.pomodoros_in_cycle,
            session_id: self.current_session,
        })
    }

    /// Resting position to persist between runs. A running or review-gated
    /// timer is recorded at the start of its mode, which is where it rests
    /// if the run is never resumed.
    pub fn position(&self, settings: &Settings) -> TimerPosition {
        let seconds_left = match self.phase {
            TimerPhase::Idle => self.seconds_left,
            TimerPhase::Running | TimerPhase::AwaitingReview => self.mode.duration_secs(settings),
        };
        TimerPosition {
            mode: self.mode,
            seconds_left,
            pomodoros_in_cycle: self.pomodoros_in_cycle,
        }
    }

    /// Put an idle timer back at a saved resting position.
    ///
    /// The countdown is clamped to the mode's current length; an empty one
    /// is refilled.
    pub fn restore_position(&mut self, position: &TimerPosition, settings: &Settings) -> bool {
        if self.phase != TimerPhase::Idle {
            return false;
        }
        let full = position.mode.duration_secs(settings);
        self.mode = position.mode;
        self.seconds_left = match position.seconds_left {
            0 => full,
            left => left.min(full),
        };
        self.pomodoros_in_cycle = position.pomodoros_in_cycle;
        true
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Flip between Idle and Running. Ignored while awaiting review.
    pub fn toggle(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        match self.phase {
            TimerPhase::Idle => vec![self.activate(ctx)],
            TimerPhase::Running => vec![self.deactivate(ctx.now)],
            TimerPhase::AwaitingReview => Vec::new(),
        }
    }

    pub fn start(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if self.phase == TimerPhase::Idle {
            self.toggle(ctx)
        } else {
            Vec::new()
        }
    }

    pub fn pause(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if self.phase == TimerPhase::Running {
            self.toggle(ctx)
        } else {
            Vec::new()
        }
    }

    /// One elapsed second. The countdown ends on the tick that would take it
    /// below one second.
    pub fn tick(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        if self.seconds_left <= 1 {
            self.seconds_left = 0;
            return self.timer_end(ctx);
        }
        self.seconds_left -= 1;
        Vec::new()
    }

    /// Move to `mode`, running immediately when `auto_start` is set.
    ///
    /// A running timer cannot be redirected to another mode, and nothing
    /// moves while a review is pending. A manual return to Work (without
    /// auto start) begins a fresh cycle.
    pub fn switch_mode(
        &mut self,
        mode: Mode,
        auto_start: bool,
        ctx: &mut TimerContext<'_>,
    ) -> Vec<Event> {
        let redirect = self.phase == TimerPhase::Running && mode != self.mode;
        if redirect || self.phase == TimerPhase::AwaitingReview {
            tracing::debug!(from = %self.mode, to = %mode, phase = ?self.phase, "mode switch rejected");
            return Vec::new();
        }
        if mode == Mode::Work && !auto_start {
            self.pomodoros_in_cycle = 0;
        }
        self.enter_mode(mode, auto_start, ctx)
    }

    /// Resolve the post-session review, filled in or skipped.
    ///
    /// Credits the pomodoro to the cycle and to the active task, then moves
    /// to the next break.
    pub fn continue_after_review(
        &mut self,
        annotations: Option<&SessionAnnotations>,
        ctx: &mut TimerContext<'_>,
    ) -> Vec<Event> {
        if self.phase != TimerPhase::AwaitingReview {
            return Vec::new();
        }
        let session_id = self.review_session.take();
        if let (Some(id), Some(annotations)) = (session_id, annotations) {
            ctx.ledger.annotate(id, annotations);
        }

        self.pomodoros_in_cycle += 1;
        let task_id = ctx.board.active_task_id().map(str::to_string);
        let task_completed = task_id
            .as_deref()
            .and_then(|id| ctx.board.complete_work_session(id))
            .is_some_and(|task| task.is_completed);

        let next_mode = if self.pomodoros_in_cycle % ctx.settings.cycle_length() == 0 {
            Mode::LongBreak
        } else {
            Mode::ShortBreak
        };
        self.phase = TimerPhase::Idle;

        let mut events = vec![Event::ReviewResolved {
            session_id,
            pomodoros_in_cycle: self.pomodoros_in_cycle,
            task_id,
            task_completed,
            next_mode,
            at: ctx.now,
        }];
        events.extend(self.enter_mode(next_mode, ctx.settings.auto_start_breaks, ctx));
        events
    }

    /// Abandon the current session. Nothing is completed or credited and
    /// the cycle position is kept.
    pub fn skip(&mut self, reason: SkipReason, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if self.phase == TimerPhase::AwaitingReview {
            return Vec::new();
        }
        ctx.ledger.record_skip(self.mode, reason, ctx.now);
        self.phase = TimerPhase::Idle;
        self.current_session = None;

        let next_mode = if self.mode == Mode::Work {
            Mode::ShortBreak
        } else {
            Mode::Work
        };
        let mut events = vec![Event::SessionSkipped {
            mode: self.mode,
            reason,
            at: ctx.now,
        }];
        events.extend(self.enter_mode(next_mode, false, ctx));
        events
    }

    /// Stop and refill the countdown for the current mode.
    pub fn reset(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if self.phase == TimerPhase::AwaitingReview {
            return Vec::new();
        }
        self.phase = TimerPhase::Idle;
        self.current_session = None;
        self.seconds_left = self.mode.duration_secs(ctx.settings);
        vec![Event::TimerReset {
            mode: self.mode,
            seconds_left: self.seconds_left,
            at: ctx.now,
        }]
    }

    /// Re-derive the idle countdown after a settings edit.
    ///
    /// A running countdown is left alone until its next transition.
    pub fn apply_settings(&mut self, previous: &Settings, settings: &Settings) -> bool {
        let duration = self.mode.duration_secs(settings);
        if self.phase != TimerPhase::Idle || duration == self.mode.duration_secs(previous) {
            return false;
        }
        self.seconds_left = duration;
        true
    }

    /// Resume from a saved snapshot if it is recent enough.
    ///
    /// Stale snapshots are dropped silently. A restored running timer picks
    /// its in-progress ledger row back up, or opens a new one when that row
    /// is gone or already finished.
    pub fn restore(&mut self, snapshot: &LastSession, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        if !snapshot.is_fresh(ctx.now) {
            tracing::debug!(saved_at = %snapshot.timestamp, "discarding stale timer snapshot");
            return Vec::new();
        }
        self.mode = snapshot.mode;
        self.seconds_left = snapshot.seconds_left;
        self.pomodoros_in_cycle = snapshot.pomodoros_in_cycle;
        self.phase = TimerPhase::Idle;
        self.review_session = None;
        self.current_session = snapshot
            .session_id
            .filter(|_| snapshot.is_active)
            .filter(|id| {
                ctx.ledger
                    .get(*id)
                    .is_some_and(|log| !log.completed && log.mode == snapshot.mode)
            });

        let mut events = vec![Event::SessionRestored {
            mode: self.mode,
            seconds_left: self.seconds_left,
            is_active: snapshot.is_active,
            at: ctx.now,
        }];
        if snapshot.is_active {
            events.push(self.activate(ctx));
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn timer_end(&mut self, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        let session_id = self.current_session.take();
        self.phase = TimerPhase::Idle;
        if let Some(id) = session_id {
            ctx.ledger.complete_session(id, &SessionAnnotations::default());
        }
        let mut events = vec![Event::TimerCompleted {
            mode: self.mode,
            session_id,
            at: ctx.now,
        }];

        if self.mode == Mode::Work {
            let completed_today = ctx.ledger.completed_work_on(ctx.now.date_naive());
            if completed_today == ctx.settings.daily_goal as usize {
                events.push(Event::DailyGoalReached {
                    completed_today,
                    goal: ctx.settings.daily_goal,
                    at: ctx.now,
                });
            }
            self.phase = TimerPhase::AwaitingReview;
            self.review_session = session_id;
            events.push(Event::ReviewRequested {
                session_id,
                at: ctx.now,
            });
        } else {
            // Chaining out of a break keeps the cycle count.
            events.extend(self.enter_mode(Mode::Work, ctx.settings.auto_start_pomos, ctx));
        }
        events
    }

    fn enter_mode(&mut self, mode: Mode, auto_start: bool, ctx: &mut TimerContext<'_>) -> Vec<Event> {
        let from = self.mode;
        self.mode = mode;
        self.seconds_left = mode.duration_secs(ctx.settings);
        let mut events = vec![Event::ModeSwitched {
            from,
            to: mode,
            seconds_left: self.seconds_left,
            auto_start,
            at: ctx.now,
        }];
        if auto_start {
            if self.phase != TimerPhase::Running {
                events.push(self.activate(ctx));
            }
        } else {
            self.phase = TimerPhase::Idle;
            self.current_session = None;
        }
        events
    }

    fn activate(&mut self, ctx: &mut TimerContext<'_>) -> Event {
        self.phase = TimerPhase::Running;
        if self.current_session.is_none() {
            let task_id = match self.mode {
                Mode::Work => ctx.board.active_task().map(|t| t.id.clone()),
                _ => None,
            };
            let planned = self.mode.duration_secs(ctx.settings);
            let log = ctx.ledger.start_session(self.mode, task_id.as_deref(), planned, ctx.now);
            self.current_session = Some(log.id);
        }
        Event::TimerStarted {
            mode: self.mode,
            seconds_left: self.seconds_left,
            session_id: self.current_session,
            at: ctx.now,
        }
    }

    fn deactivate(&mut self, now: DateTime<Utc>) -> Event {
        self.phase = TimerPhase::Idle;
        self.current_session = None;
        Event::TimerPaused {
            mode: self.mode,
            seconds_left: self.seconds_left,
            at: now,
        }
    }
}
