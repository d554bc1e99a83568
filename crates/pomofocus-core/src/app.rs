//! Application facade.
//!
//! [`Pomofocus`] owns every store (settings, timer, ledger, task board,
//! journal, templates) and the storage handle. Each command mutates the
//! in-memory state first and then writes the affected slots, so a save
//! always reflects a finished mutation. Storage and notifier failures are
//! logged and queued as [`Event::Notice`]; they never undo a transition.
//!
//! Events produced by commands are queued and collected with
//! [`Pomofocus::take_events`].

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use std::path::PathBuf;

use crate::error::{CoreError, Result, ValidationError};
use crate::estimate::{estimate_finish, FinishEstimate};
use crate::events::Event;
use crate::journal::{DailyReview, Journal};
use crate::notify::{Notifier, SilentNotifier};
use crate::session::{DistractionLog, Reports, SessionAnnotations, SessionLedger, SkipReason};
use crate::storage::{Database, Settings, Slot};
use crate::task::assistant::{self, TaskBreakdown};
use crate::task::template::Template;
use crate::task::{Priority, ScheduleDate, Task, TaskBoard, TaskUpdate};
use crate::timer::{LastSession, Mode, TimerContext, TimerEngine, TimerPosition};

const LEDGER_SLOTS: [Slot; 3] = [Slot::SessionLogs, Slot::SkippedLogs, Slot::DistractionLogs];
const BOARD_SLOTS: [Slot; 5] = [
    Slot::Tasks,
    Slot::ArchivedTasks,
    Slot::ActiveTaskId,
    Slot::LastDeleted,
    Slot::ReviewPromptedOn,
];

pub struct Pomofocus {
    db: Database,
    settings: Settings,
    /// Where settings are written back; `None` keeps them in memory.
    settings_path: Option<PathBuf>,
    timer: TimerEngine,
    ledger: SessionLedger,
    board: TaskBoard,
    journal: Journal,
    templates: Vec<Template>,
    notifier: Box<dyn Notifier>,
    soundscape_playing: bool,
    outbox: Vec<Event>,
}

impl Pomofocus {
    /// Open the default data directory.
    pub fn open() -> Result<Self> {
        let db = Database::open()?;
        let settings_path = Settings::path()?;
        let settings = Settings::load_from(&settings_path)?;
        let mut app = Self::with_parts(db, settings);
        app.settings_path = Some(settings_path);
        Ok(app)
    }

    /// Build from an open database and settings, loading every slot.
    pub fn with_parts(db: Database, settings: Settings) -> Self {
        let ledger = SessionLedger::new(
            db.load_slot(Slot::SessionLogs),
            db.load_slot(Slot::SkippedLogs),
            db.load_slot(Slot::DistractionLogs),
        );
        let board = TaskBoard::new(
            db.load_slot(Slot::Tasks),
            db.load_slot(Slot::ArchivedTasks),
            db.load_slot(Slot::ActiveTaskId),
            db.load_slot(Slot::LastDeleted),
        )
        .with_review_prompted_on(db.load_slot(Slot::ReviewPromptedOn));
        let mut timer = TimerEngine::new(&settings);
        if let Some(position) = db.load_slot::<Option<TimerPosition>>(Slot::TimerPosition) {
            timer.restore_position(&position, &settings);
        }
        let journal = Journal::new(db.load_slot(Slot::DailyReviews), db.load_slot(Slot::JournalEntries));
        let templates = db.load_slot(Slot::Templates);
        tracing::debug!(
            tasks = board.tasks().len(),
            sessions = ledger.sessions().len(),
            "state loaded"
        );
        Self {
            timer,
            db,
            settings,
            settings_path: None,
            ledger,
            board,
            journal,
            templates,
            notifier: Box::new(SilentNotifier),
            soundscape_playing: false,
            outbox: Vec::new(),
        }
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = notifier;
    }

    /// Drain queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn reports(&self) -> Reports<'_> {
        Reports::new(&self.ledger)
    }

    pub fn status(&self, now: DateTime<Utc>) -> Event {
        self.timer.snapshot_event(&self.settings, now)
    }

    pub fn estimate(&self, now: DateTime<Utc>) -> Option<FinishEstimate> {
        estimate_finish(self.board.tasks(), &self.settings, now)
    }

    /// A random break activity, offered only while on a break.
    pub fn break_suggestion<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        if self.timer.mode().is_break() {
            self.settings.break_suggestion(rng)
        } else {
            None
        }
    }

    // ── Suspend / resume ─────────────────────────────────────────────

    /// Pick up a saved timer snapshot. The slot is cleared either way.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        let Some(snapshot) = self.db.load_slot::<Option<LastSession>>(Slot::LastSession) else {
            return;
        };
        // Idle engine: this writes an empty snapshot.
        self.save_slot(Slot::LastSession, now);
        let events = self.timer.restore(&snapshot, &mut Self::context(
            &self.settings,
            &mut self.ledger,
            &mut self.board,
            now,
        ));
        self.after_timer(events, now);
    }

    /// The saved snapshot if it is still fresh. Does not consume it.
    pub fn saved_session(&self, now: DateTime<Utc>) -> Option<LastSession> {
        self.db
            .load_slot::<Option<LastSession>>(Slot::LastSession)
            .filter(|s| s.is_fresh(now))
    }

    /// Save the live timer state if it is running, and where it rests.
    pub fn suspend(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.db.save_slot(Slot::LastSession, &self.timer.snapshot(now))?;
        self.db.save_slot(Slot::TimerPosition, &self.timer.position(&self.settings))?;
        Ok(())
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.toggle(ctx));
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.start(ctx));
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.pause(ctx));
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.tick(ctx));
    }

    pub fn switch_mode(&mut self, mode: Mode, auto_start: bool, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.switch_mode(mode, auto_start, ctx));
    }

    /// Resolve the post-session review. `None` is an explicit skip.
    pub fn continue_after_review(&mut self, annotations: Option<SessionAnnotations>, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.continue_after_review(annotations.as_ref(), ctx));
    }

    pub fn skip(&mut self, reason: SkipReason, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.skip(reason, ctx));
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.drive(now, |timer, ctx| timer.reset(ctx));
    }

    /// Log a distraction against the running Work session.
    ///
    /// Ignored unless a Work session is active.
    pub fn log_distraction(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Option<DistractionLog> {
        if !self.timer.is_active() || self.timer.mode() != Mode::Work {
            return None;
        }
        let entry = self
            .ledger
            .record_distraction(self.timer.current_session(), reason, now);
        self.outbox.push(Event::DistractionLogged {
            id: entry.id,
            session_id: entry.session_id,
            at: now,
        });
        self.outbox.push(Event::notice("Distraction logged.", now));
        self.save_slot(Slot::DistractionLogs, now);
        Some(entry)
    }

    fn context<'a>(
        settings: &'a Settings,
        ledger: &'a mut SessionLedger,
        board: &'a mut TaskBoard,
        now: DateTime<Utc>,
    ) -> TimerContext<'a> {
        TimerContext {
            settings,
            ledger,
            board,
            now,
        }
    }

    fn drive<F>(&mut self, now: DateTime<Utc>, command: F)
    where
        F: FnOnce(&mut TimerEngine, &mut TimerContext<'_>) -> Vec<Event>,
    {
        let mut ctx = Self::context(&self.settings, &mut self.ledger, &mut self.board, now);
        let events = command(&mut self.timer, &mut ctx);
        self.after_timer(events, now);
    }

    fn after_timer(&mut self, events: Vec<Event>, now: DateTime<Utc>) {
        if events.is_empty() {
            return;
        }
        for slot in LEDGER_SLOTS {
            self.save_slot(slot, now);
        }
        self.save_slot(Slot::TimerPosition, now);
        let credited = events
            .iter()
            .any(|e| matches!(e, Event::ReviewResolved { task_id: Some(_), .. }));
        let completed = events.iter().any(|e| matches!(e, Event::TimerCompleted { .. }));
        self.outbox.extend(events);

        if completed {
            self.play_alarm(now);
        }
        self.sync_soundscape(now);
        if credited {
            self.after_board_change(now);
        }
    }

    fn play_alarm(&mut self, now: DateTime<Utc>) {
        if self.settings.dnd_mode {
            return;
        }
        let s = &self.settings;
        if let Err(e) = self.notifier.play_alarm(&s.alarm_sound, s.alarm_volume, s.alarm_fade_in) {
            tracing::warn!(error = %e, "alarm playback failed");
            self.outbox.push(Event::notice(format!("Could not play alarm: {e}"), now));
        }
    }

    fn sync_soundscape(&mut self, now: DateTime<Utc>) {
        let wanted = self.timer.is_active()
            && self.timer.mode() == Mode::Work
            && self.settings.soundscape != "none"
            && !self.settings.dnd_mode;
        if wanted == self.soundscape_playing {
            return;
        }
        self.soundscape_playing = wanted;
        let s = &self.settings;
        if let Err(e) = self.notifier.set_soundscape(&s.soundscape, s.soundscape_volume, wanted) {
            tracing::warn!(error = %e, "soundscape toggle failed");
            self.outbox.push(Event::notice(format!("Could not change soundscape: {e}"), now));
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.settings.clone();
        updated.set(key, value)?;
        self.replace_settings(updated)
    }

    pub fn reset_settings(&mut self) -> Result<()> {
        self.replace_settings(Settings::default())
    }

    fn replace_settings(&mut self, updated: Settings) -> Result<()> {
        if let Some(path) = &self.settings_path {
            updated.save_to(path)?;
        }
        let previous = std::mem::replace(&mut self.settings, updated);
        let now = Utc::now();
        if self.timer.apply_settings(&previous, &self.settings) {
            tracing::debug!(seconds_left = self.timer.seconds_left(), "idle countdown re-derived");
            self.save_slot(Slot::TimerPosition, now);
        }
        self.sync_soundscape(now);
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(
        &mut self,
        title: &str,
        estimated_pomos: i64,
        priority: Priority,
        schedule_date: ScheduleDate,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = Task::new(title, estimated_pomos, priority, schedule_date, now)?;
        self.board.add(task.clone());
        self.after_board_change(now);
        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate, now: DateTime<Utc>) -> Result<()> {
        self.board.update(id, update)?;
        self.after_board_change(now);
        Ok(())
    }

    pub fn set_active_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.set_active(id))
    }

    pub fn toggle_complete(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.toggle_complete(id))
    }

    pub fn toggle_pin(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.toggle_pin(id))
    }

    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.delete(id, now).is_some())
    }

    pub fn undo_delete(&mut self, now: DateTime<Utc>) -> bool {
        let restored = self.board.undo_delete(now);
        // The pending record is consumed either way.
        self.after_board_change(now);
        restored
    }

    pub fn archive_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.archive(id))
    }

    pub fn restore_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.restore(id))
    }

    pub fn purge_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        self.board_command(now, |board| board.delete_permanently(id))
    }

    /// Ask `generator` to break `prompt` down and add what it proposes.
    ///
    /// Returns the number of tasks added. A failure leaves the board as it
    /// was and is also queued as a notice.
    pub fn import_breakdown(
        &mut self,
        generator: &dyn TaskBreakdown,
        prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let proposals = match assistant::break_down(generator, prompt) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "task breakdown failed");
                self.outbox.push(Event::notice(e.to_string(), now));
                return Err(e.into());
            }
        };
        let tasks = assistant::into_tasks(proposals, now);
        let added = tasks.len();
        self.board.extend(tasks);
        self.after_board_change(now);
        Ok(added)
    }

    fn board_command<F>(&mut self, now: DateTime<Utc>, command: F) -> bool
    where
        F: FnOnce(&mut TaskBoard) -> bool,
    {
        let changed = command(&mut self.board);
        if changed {
            self.after_board_change(now);
        }
        changed
    }

    fn after_board_change(&mut self, now: DateTime<Utc>) {
        self.board.expire_undo(now);
        let today = now.date_naive();
        let reviewed = self.journal.has_review_for(today);
        let prompt = self.board.check_day_complete(today, reviewed, now);
        for slot in BOARD_SLOTS {
            self.save_slot(slot, now);
        }
        if let Some(event) = prompt {
            tracing::info!(%today, "all tasks done");
            self.outbox.push(event);
        }
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Save the tasks named by `task_ids` as a template.
    pub fn save_template(&mut self, name: &str, task_ids: &[String], now: DateTime<Utc>) -> Result<Template> {
        let selection = self
            .board
            .tasks()
            .iter()
            .filter(|t| task_ids.contains(&t.id));
        let template = Template::from_tasks(name, selection)?;
        self.templates.push(template.clone());
        self.save_slot(Slot::Templates, now);
        Ok(template)
    }

    pub fn apply_template(&mut self, id: &str, now: DateTime<Utc>) -> Result<usize> {
        let template = self
            .templates
            .iter()
            .find(|t| t.id == id || t.name == id)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "template".into(),
                message: format!("no template named {id}"),
            })?;
        let tasks = template.instantiate(now);
        let added = tasks.len();
        self.board.extend(tasks);
        self.after_board_change(now);
        Ok(added)
    }

    pub fn delete_template(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id && t.name != id);
        let removed = self.templates.len() != before;
        if removed {
            self.save_slot(Slot::Templates, now);
        }
        removed
    }

    // ── Journal ──────────────────────────────────────────────────────

    pub fn save_daily_review(&mut self, review: DailyReview, now: DateTime<Utc>) {
        self.journal.add_review(review);
        self.save_slot(Slot::DailyReviews, now);
    }

    pub fn write_journal(&mut self, date: NaiveDate, content: &str, now: DateTime<Utc>) {
        self.journal.write_entry(date, content);
        self.save_slot(Slot::JournalEntries, now);
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn save_slot(&mut self, slot: Slot, now: DateTime<Utc>) {
        let result = match slot {
            Slot::Tasks => self.db.save_slot(slot, self.board.tasks()),
            Slot::ArchivedTasks => self.db.save_slot(slot, self.board.archived()),
            Slot::ActiveTaskId => self.db.save_slot(slot, &self.board.active_task_id()),
            Slot::LastDeleted => self.db.save_slot(slot, &self.board.last_deleted()),
            Slot::SessionLogs => self.db.save_slot(slot, self.ledger.sessions()),
            Slot::SkippedLogs => self.db.save_slot(slot, self.ledger.skipped()),
            Slot::DistractionLogs => self.db.save_slot(slot, self.ledger.distractions()),
            Slot::DailyReviews => self.db.save_slot(slot, self.journal.reviews()),
            Slot::JournalEntries => self.db.save_slot(slot, self.journal.entries()),
            Slot::Templates => self.db.save_slot(slot, &self.templates),
            Slot::ReviewPromptedOn => self.db.save_slot(slot, &self.board.review_prompted_on()),
            Slot::LastSession => self.db.save_slot(slot, &self.timer.snapshot(now)),
            Slot::TimerPosition => self.db.save_slot(slot, &self.timer.position(&self.settings)),
        };
        self.report_save(slot, result.map_err(CoreError::from), now);
    }

    fn report_save(&mut self, slot: Slot, result: Result<()>, now: DateTime<Utc>) {
        if let Err(e) = result {
            tracing::warn!(slot = slot.key(), error = %e, "save failed");
            self.outbox.push(Event::notice(format!("Could not save {}: {e}", slot.key()), now));
        }
    }
}
