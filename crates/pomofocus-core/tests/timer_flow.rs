//! End-to-end timer flows through the public API.
//!
//! Each test drives the state machine one second at a time against an
//! in-memory ledger and board, the way a front end would.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pomofocus_core::{
    Database, Event, Mode, Pomofocus, Priority, ScheduleDate, SessionAnnotations, SessionLedger,
    Settings, SkipReason, TaskBoard, Task, TimerContext, TimerEngine, TimerPhase,
};

// ============================================================================
// Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

struct Harness {
    settings: Settings,
    ledger: SessionLedger,
    board: TaskBoard,
    now: DateTime<Utc>,
    engine: TimerEngine,
}

impl Harness {
    fn new(settings: Settings) -> Self {
        let engine = TimerEngine::new(&settings);
        Self {
            settings,
            ledger: SessionLedger::default(),
            board: TaskBoard::default(),
            now: t0(),
            engine,
        }
    }

    fn with_task(mut self, estimate: i64) -> Self {
        let task = Task::new("Draft chapter", estimate, Priority::High, ScheduleDate::Today, self.now).unwrap();
        self.board.add(task);
        self
    }

    fn run<F>(&mut self, command: F) -> Vec<Event>
    where
        F: FnOnce(&mut TimerEngine, &mut TimerContext<'_>) -> Vec<Event>,
    {
        let mut ctx = TimerContext {
            settings: &self.settings,
            ledger: &mut self.ledger,
            board: &mut self.board,
            now: self.now,
        };
        command(&mut self.engine, &mut ctx)
    }

    /// Tick until the countdown ends, advancing the clock one second per tick.
    fn run_out(&mut self) -> Vec<Event> {
        loop {
            self.now = self.now + Duration::seconds(1);
            let events = self.run(|e, ctx| e.tick(ctx));
            if !events.is_empty() {
                return events;
            }
        }
    }

    fn active_task(&self) -> &Task {
        self.board.active_task().unwrap()
    }
}

// ============================================================================
// Work sessions
// ============================================================================

#[test]
fn default_work_session_takes_1500_ticks() {
    let mut h = Harness::new(Settings::default());
    h.run(|e, ctx| e.toggle(ctx));
    let id = h.engine.current_session().unwrap();
    assert_eq!(h.engine.seconds_left(), 1500);

    let mut ticks = 0;
    let events = loop {
        ticks += 1;
        let events = h.run(|e, ctx| e.tick(ctx));
        if !events.is_empty() {
            break events;
        }
        assert_eq!(h.engine.seconds_left(), 1500 - ticks);
    };
    assert_eq!(ticks, 1500);
    assert_eq!(h.engine.seconds_left(), 0);
    assert!(h.ledger.get(id).unwrap().completed);
    assert!(matches!(events[0], Event::TimerCompleted { mode: Mode::Work, .. }));
    assert_eq!(h.engine.phase(), TimerPhase::AwaitingReview);
}

#[test]
fn task_progress_is_credited_only_after_review() {
    let mut h = Harness::new(Settings::default()).with_task(2);
    h.run(|e, ctx| e.toggle(ctx));
    h.run_out();
    assert_eq!(h.active_task().completed_pomos, 0);

    let notes = SessionAnnotations {
        label: Some("outline".into()),
        ..Default::default()
    };
    let events = h.run(|e, ctx| e.continue_after_review(Some(&notes), ctx));
    assert_eq!(h.active_task().completed_pomos, 1);
    assert!(!h.active_task().is_completed);
    assert!(matches!(
        events[0],
        Event::ReviewResolved { next_mode: Mode::ShortBreak, task_completed: false, .. }
    ));
    assert_eq!(h.ledger.sessions()[0].label.as_deref(), Some("outline"));

    // Second resolution of the same gate is a no-op.
    assert!(h.run(|e, ctx| e.continue_after_review(None, ctx)).is_empty());
    assert_eq!(h.active_task().completed_pomos, 1);
}

#[test]
fn full_cycle_reaches_long_break() {
    let settings = Settings {
        auto_start_breaks: true,
        auto_start_pomos: true,
        ..Settings::default()
    };
    let mut h = Harness::new(settings).with_task(10);
    h.run(|e, ctx| e.toggle(ctx));

    let mut breaks = Vec::new();
    for _ in 0..4 {
        h.run_out();
        h.run(|e, ctx| e.continue_after_review(None, ctx));
        breaks.push(h.engine.mode());
        assert!(h.engine.is_active());
        h.run_out();
        assert_eq!(h.engine.mode(), Mode::Work);
    }
    assert_eq!(
        breaks,
        vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
    );
    assert_eq!(h.active_task().completed_pomos, 4);
    assert_eq!(h.ledger.completed_work_on(h.now.date_naive()), 4);
}

#[test]
fn pause_leaves_abandoned_row_and_resume_opens_new_one() {
    let mut h = Harness::new(Settings::default());
    h.run(|e, ctx| e.toggle(ctx));
    for _ in 0..10 {
        h.run(|e, ctx| e.tick(ctx));
    }
    h.run(|e, ctx| e.toggle(ctx));
    assert_eq!(h.engine.seconds_left(), 1490);
    assert!(h.run(|e, ctx| e.tick(ctx)).is_empty());
    assert_eq!(h.engine.seconds_left(), 1490);

    h.run(|e, ctx| e.toggle(ctx));
    h.run_out();
    let rows = h.ledger.sessions();
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].completed);
    assert!(rows[1].completed);
}

// ============================================================================
// Skip
// ============================================================================

#[test]
fn skip_never_completes_or_credits() {
    let mut h = Harness::new(Settings::default()).with_task(1);
    h.run(|e, ctx| e.toggle(ctx));
    for _ in 0..600 {
        h.run(|e, ctx| e.tick(ctx));
    }
    let events = h.run(|e, ctx| e.skip(SkipReason::UnexpectedMeeting, ctx));

    assert!(matches!(events[0], Event::SessionSkipped { mode: Mode::Work, .. }));
    assert!(h.ledger.sessions().iter().all(|s| !s.completed));
    assert_eq!(h.active_task().completed_pomos, 0);
    assert_eq!(h.ledger.skipped()[0].reason, SkipReason::UnexpectedMeeting);
    assert_eq!(h.engine.mode(), Mode::ShortBreak);
    assert_eq!(h.engine.seconds_left(), 300);
    assert!(!h.engine.is_active());
}

#[test]
fn skipping_a_break_returns_to_idle_work() {
    let mut h = Harness::new(Settings::default());
    h.run(|e, ctx| e.switch_mode(Mode::LongBreak, true, ctx));
    h.run(|e, ctx| e.skip(SkipReason::NotNeeded, ctx));
    assert_eq!(h.engine.mode(), Mode::Work);
    assert_eq!(h.engine.seconds_left(), 1500);
    assert!(!h.engine.is_active());
}

// ============================================================================
// Facade
// ============================================================================

#[test]
fn facade_persists_after_each_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomofocus.db");
    let now = t0();

    let mut app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), Settings::default());
    let task = app.add_task("Review PR", 3, Priority::Medium, ScheduleDate::Today, now).unwrap();
    app.start(now);
    app.skip(SkipReason::Fatigued, now);
    drop(app);

    let app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), Settings::default());
    assert_eq!(app.board().active_task_id(), Some(task.id.as_str()));
    assert_eq!(app.ledger().skipped().len(), 1);
    assert_eq!(app.ledger().sessions().len(), 1);
}

#[test]
fn stale_snapshot_is_discarded_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomofocus.db");
    let now = t0();
    {
        let mut app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), Settings::default());
        app.switch_mode(Mode::ShortBreak, true, now);
        app.suspend(now).unwrap();
    }
    let mut app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), Settings::default());
    app.resume(now + Duration::minutes(6));
    assert!(app.take_events().is_empty());
    // The run is lost but the timer still rests on the break it was in.
    assert_eq!(app.timer().mode(), Mode::ShortBreak);
    assert_eq!(app.timer().seconds_left(), 300);
    assert!(!app.timer().is_active());

    // The slot was consumed.
    let mut again = Pomofocus::with_parts(Database::open_at(&path).unwrap(), Settings::default());
    again.resume(now + Duration::minutes(7));
    assert!(again.take_events().is_empty());
}

/// Run the current mode to its end in a fresh process on the same database.
fn finish_in_new_process(path: &std::path::Path, settings: &Settings, now: &mut DateTime<Utc>) -> Pomofocus {
    let mut app = Pomofocus::with_parts(Database::open_at(path).unwrap(), settings.clone());
    app.resume(*now);
    app.start(*now);
    while app.timer().is_active() {
        *now = *now + Duration::seconds(1);
        app.tick(*now);
    }
    if app.timer().is_awaiting_review() {
        app.continue_after_review(None, *now);
    }
    app
}

#[test]
fn cycle_position_survives_separate_processes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomofocus.db");
    let settings = Settings {
        pomodoro: 1,
        short_break: 1,
        long_break: 2,
        ..Settings::default()
    };
    let mut now = t0();

    let mut breaks = Vec::new();
    for round in 0..4 {
        if round == 2 {
            // Interrupt one Work session halfway and pick it up elsewhere.
            let mut app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), settings.clone());
            app.start(now);
            for _ in 0..30 {
                now = now + Duration::seconds(1);
                app.tick(now);
            }
            app.suspend(now).unwrap();
        }
        let app = finish_in_new_process(&path, &settings, &mut now);
        assert_eq!(app.timer().pomodoros_in_cycle(), round + 1);
        drop(app);

        let app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), settings.clone());
        assert!(!app.timer().is_active());
        breaks.push(app.timer().mode());
        drop(app);

        let app = finish_in_new_process(&path, &settings, &mut now);
        assert_eq!(app.timer().mode(), Mode::Work);
    }

    assert_eq!(
        breaks,
        vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
    );
    let app = Pomofocus::with_parts(Database::open_at(&path).unwrap(), settings);
    assert_eq!(app.ledger().completed_work_on(now.date_naive()), 4);
    // The interrupted session kept a single row.
    assert_eq!(
        app.ledger().sessions().iter().filter(|s| s.mode == Mode::Work).count(),
        4
    );
}
