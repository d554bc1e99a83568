//! Task progression engine.
//!
//! Owns the active and archived task collections plus the active task id,
//! and applies every mutation that touches task progress or dependencies:
//!
//! - work-session completion increments `completed_pomos` of the active task
//! - deletion strips the deleted id from every `depends_on` list and can be
//!   undone within [`UNDO_WINDOW_SECS`]
//! - archive / restore move tasks between collections, restore drops progress
//!
//! The board also watches for the moment the last incomplete task is done
//! and asks for the end-of-day review, at most once per calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{compare_for_view, is_locked, validate_estimate, validate_title, Priority, ScheduleDate, Task, TaskSort};
use crate::error::ValidationError;
use crate::events::Event;

/// How long a deleted task can be brought back.
pub const UNDO_WINDOW_SECS: i64 = 7;

/// A soft-deleted task awaiting a possible undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTask {
    pub task: Task,
    pub index: usize,
    pub deleted_at: DateTime<Utc>,
}

/// Partial edit of a task. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub estimated_pomos: Option<i64>,
    pub priority: Option<Priority>,
    pub schedule_date: Option<ScheduleDate>,
    pub depends_on: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    archived: Vec<Task>,
    active_task_id: Option<String>,
    last_deleted: Option<DeletedTask>,
    /// Incomplete count seen by the last [`TaskBoard::check_day_complete`].
    incomplete_seen: usize,
    review_prompted_on: Option<NaiveDate>,
}

impl TaskBoard {
    pub fn new(
        tasks: Vec<Task>,
        archived: Vec<Task>,
        active_task_id: Option<String>,
        last_deleted: Option<DeletedTask>,
    ) -> Self {
        let incomplete_seen = tasks.iter().filter(|t| !t.is_completed).count();
        Self {
            tasks,
            archived,
            active_task_id,
            last_deleted,
            incomplete_seen,
            review_prompted_on: None,
        }
    }

    /// Carry over the day the end-of-day prompt was last shown.
    pub fn with_review_prompted_on(mut self, date: Option<NaiveDate>) -> Self {
        self.review_prompted_on = date;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The raw active id, which may point at a task that no longer exists.
    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    /// The active task, if the id still resolves.
    pub fn active_task(&self) -> Option<&Task> {
        self.active_task_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn last_deleted(&self) -> Option<&DeletedTask> {
        self.last_deleted.as_ref()
    }

    pub fn review_prompted_on(&self) -> Option<NaiveDate> {
        self.review_prompted_on
    }

    pub fn is_locked(&self, task: &Task) -> bool {
        is_locked(task, &self.tasks)
    }

    pub fn incomplete_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_completed).count()
    }

    /// Filtered, sorted view for display.
    pub fn view(&self, schedule: ScheduleDate, search: &str, sort: TaskSort) -> Vec<&Task> {
        let needle = search.to_lowercase();
        let mut visible: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.schedule_date == schedule && t.title.to_lowercase().contains(&needle))
            .collect();
        visible.sort_by(|a, b| compare_for_view(a, b, sort));
        visible
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a validated task; it becomes active if nothing is.
    pub fn add(&mut self, task: Task) {
        if self.active_task_id.is_none() {
            self.active_task_id = Some(task.id.clone());
        }
        self.tasks.push(task);
    }

    /// Bulk insert, used by templates and the task breakdown assistant.
    pub fn extend(&mut self, tasks: Vec<Task>) {
        self.tasks.extend(tasks);
    }

    /// Make `id` the active task. Missing, completed and locked tasks are
    /// refused.
    pub fn set_active(&mut self, id: &str) -> bool {
        match self.get(id) {
            Some(task) if !task.is_completed && !self.is_locked(task) => {
                self.active_task_id = Some(id.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn update(&mut self, id: &str, update: TaskUpdate) -> Result<(), ValidationError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;
        let estimate = update.estimated_pomos.map(validate_estimate).transpose()?;
        let deps = update.depends_on.map(|deps| self.clean_dependencies(id, deps));

        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::TaskNotFound(id.to_string()))?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(estimate) = estimate {
            task.estimated_pomos = estimate;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(schedule) = update.schedule_date {
            task.schedule_date = schedule;
        }
        if let Some(deps) = deps {
            task.depends_on = deps;
        }
        Ok(())
    }

    // Drop self references, unknown ids and duplicates.
    fn clean_dependencies(&self, id: &str, deps: Vec<String>) -> Vec<String> {
        let mut cleaned: Vec<String> = Vec::with_capacity(deps.len());
        for dep in deps {
            if dep != id && self.get(&dep).is_some() && !cleaned.contains(&dep) {
                cleaned.push(dep);
            }
        }
        cleaned
    }

    /// Flip completion by hand. Completing fills the estimate, reopening
    /// clears progress.
    pub fn toggle_complete(&mut self, id: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                if task.is_completed {
                    task.reset_progress();
                } else {
                    task.is_completed = true;
                    task.completed_pomos = task.estimated_pomos;
                }
                true
            }
            None => false,
        }
    }

    pub fn toggle_pin(&mut self, id: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.is_pinned = !task.is_pinned;
                true
            }
            None => false,
        }
    }

    /// Credit one finished Work session to `task_id`.
    ///
    /// Returns the updated task, or `None` when the id does not resolve.
    pub fn complete_work_session(&mut self, task_id: &str) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.record_pomodoro();
        tracing::debug!(
            task_id,
            completed = task.completed_pomos,
            estimated = task.estimated_pomos,
            "pomodoro credited"
        );
        Some(task)
    }

    /// Soft-delete a task and strip it from every dependency list.
    ///
    /// If it was active, the first other incomplete task takes over.
    pub fn delete(&mut self, id: &str, now: DateTime<Utc>) -> Option<&DeletedTask> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(index);
        for other in &mut self.tasks {
            other.depends_on.retain(|dep| dep != id);
        }
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = self
                .tasks
                .iter()
                .find(|t| !t.is_completed)
                .map(|t| t.id.clone());
        }
        self.last_deleted = Some(DeletedTask {
            task,
            index,
            deleted_at: now,
        });
        self.last_deleted.as_ref()
    }

    /// Re-insert the last deleted task at its former position if the undo
    /// window is still open. The pending record is consumed either way.
    pub fn undo_delete(&mut self, now: DateTime<Utc>) -> bool {
        let Some(deleted) = self.last_deleted.take() else {
            return false;
        };
        if (now - deleted.deleted_at).num_seconds() > UNDO_WINDOW_SECS {
            return false;
        }
        let index = deleted.index.min(self.tasks.len());
        self.tasks.insert(index, deleted.task);
        true
    }

    /// Drop a pending undo record whose window has closed.
    pub fn expire_undo(&mut self, now: DateTime<Utc>) -> bool {
        match &self.last_deleted {
            Some(d) if (now - d.deleted_at).num_seconds() > UNDO_WINDOW_SECS => {
                self.last_deleted = None;
                true
            }
            _ => false,
        }
    }

    /// Move a task to the front of the archive.
    pub fn archive(&mut self, id: &str) -> bool {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(index) => {
                let task = self.tasks.remove(index);
                self.archived.insert(0, task);
                true
            }
            None => false,
        }
    }

    /// Bring an archived task back with its progress reset.
    pub fn restore(&mut self, id: &str) -> bool {
        match self.archived.iter().position(|t| t.id == id) {
            Some(index) => {
                let mut task = self.archived.remove(index);
                task.reset_progress();
                self.tasks.push(task);
                true
            }
            None => false,
        }
    }

    /// Remove a task from the archive for good.
    pub fn delete_permanently(&mut self, id: &str) -> bool {
        let before = self.archived.len();
        self.archived.retain(|t| t.id != id);
        self.archived.len() != before
    }

    /// Emit the end-of-day review prompt when the board goes from at least
    /// one incomplete task to none. Suppressed when a review for `today`
    /// already exists or the prompt was already shown today.
    pub fn check_day_complete(
        &mut self,
        today: NaiveDate,
        reviewed_today: bool,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        let incomplete = self.incomplete_count();
        let had_incomplete = self.incomplete_seen > 0;
        self.incomplete_seen = incomplete;

        if !had_incomplete || incomplete > 0 || self.tasks.is_empty() {
            return None;
        }
        if reviewed_today || self.review_prompted_on == Some(today) {
            return None;
        }
        self.review_prompted_on = Some(today);
        Some(Event::DailyReviewRequested { date: today, at: now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::test_support::{depending, task};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn board(tasks: Vec<Task>) -> TaskBoard {
        TaskBoard::new(tasks, vec![], None, None)
    }

    #[test]
    fn add_activates_first_task() {
        let mut b = TaskBoard::default();
        b.add(task("a"));
        b.add(task("b"));
        assert_eq!(b.active_task_id(), Some("a"));
    }

    #[test]
    fn set_active_refuses_locked_and_completed() {
        let mut done = task("done");
        done.is_completed = true;
        let mut b = board(vec![task("a"), depending("b", &["a"]), done]);
        assert!(!b.set_active("b"));
        assert!(!b.set_active("done"));
        assert!(!b.set_active("ghost"));
        assert!(b.set_active("a"));
        assert_eq!(b.active_task_id(), Some("a"));
    }

    #[test]
    fn delete_strips_dependencies_and_unlocks() {
        let mut b = board(vec![task("a"), depending("b", &["a"]), depending("c", &["a", "b"])]);
        let locked = b.get("b").cloned().unwrap();
        assert!(b.is_locked(&locked));

        b.delete("a", now());
        assert!(b.tasks().iter().all(|t| !t.depends_on.contains(&"a".to_string())));
        let unlocked = b.get("b").cloned().unwrap();
        assert!(!b.is_locked(&unlocked));
        assert_eq!(b.get("c").unwrap().depends_on, vec!["b".to_string()]);
    }

    #[test]
    fn deleting_active_moves_to_next_incomplete() {
        let mut done = task("done");
        done.is_completed = true;
        let mut b = TaskBoard::new(vec![task("a"), done, task("c")], vec![], Some("a".into()), None);
        b.delete("a", now());
        assert_eq!(b.active_task_id(), Some("c"));
    }

    #[test]
    fn undo_restores_position_within_window() {
        let mut b = board(vec![task("a"), task("b"), task("c")]);
        b.delete("b", now());
        assert!(b.undo_delete(now() + Duration::seconds(5)));
        let ids: Vec<_> = b.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(b.last_deleted().is_none());
    }

    #[test]
    fn undo_fails_after_window() {
        let mut b = board(vec![task("a")]);
        b.delete("a", now());
        assert!(!b.undo_delete(now() + Duration::seconds(8)));
        assert!(b.tasks().is_empty());
    }

    #[test]
    fn expire_undo_clears_stale_record() {
        let mut b = board(vec![task("a")]);
        b.delete("a", now());
        assert!(!b.expire_undo(now() + Duration::seconds(3)));
        assert!(b.expire_undo(now() + Duration::seconds(30)));
        assert!(b.last_deleted().is_none());
    }

    #[test]
    fn complete_work_session_caps_completion() {
        let mut b = board(vec![task("a")]);
        assert!(!b.complete_work_session("a").unwrap().is_completed);
        assert!(b.complete_work_session("a").unwrap().is_completed);
        assert!(b.complete_work_session("ghost").is_none());
    }

    #[test]
    fn archive_restore_roundtrip_resets_progress() {
        let mut original = task("a");
        original.completed_pomos = 2;
        original.is_completed = true;
        original.is_pinned = true;
        let mut b = board(vec![original.clone()]);

        assert!(b.archive("a"));
        assert!(b.tasks().is_empty());
        assert!(b.restore("a"));
        assert!(b.archived().is_empty());

        let expected = Task {
            completed_pomos: 0,
            is_completed: false,
            ..original
        };
        assert_eq!(b.get("a"), Some(&expected));
    }

    #[test]
    fn archive_is_newest_first_and_purge_is_final() {
        let mut b = board(vec![task("a"), task("b")]);
        b.archive("a");
        b.archive("b");
        assert_eq!(b.archived()[0].id, "b");
        assert!(b.delete_permanently("a"));
        assert!(!b.delete_permanently("a"));
        assert!(!b.restore("a"));
    }

    #[test]
    fn toggle_complete_fills_and_clears() {
        let mut b = board(vec![task("a")]);
        b.toggle_complete("a");
        assert_eq!(b.get("a").unwrap().completed_pomos, 2);
        b.toggle_complete("a");
        let t = b.get("a").unwrap();
        assert_eq!(t.completed_pomos, 0);
        assert!(!t.is_completed);
    }

    #[test]
    fn update_validates_and_cleans_dependencies() {
        let mut b = board(vec![task("a"), task("b")]);
        assert_eq!(
            b.update("a", TaskUpdate { title: Some(" ".into()), ..Default::default() }),
            Err(ValidationError::BlankTitle)
        );
        b.update(
            "a",
            TaskUpdate {
                depends_on: Some(vec!["a".into(), "b".into(), "ghost".into(), "b".into()]),
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .unwrap();
        let a = b.get("a").unwrap();
        assert_eq!(a.depends_on, vec!["b".to_string()]);
        assert_eq!(a.priority, Priority::High);
        assert!(matches!(
            b.update("ghost", TaskUpdate::default()),
            Err(ValidationError::TaskNotFound(_))
        ));
    }

    #[test]
    fn view_filters_by_schedule_and_search() {
        let mut later = task("later");
        later.schedule_date = ScheduleDate::Later;
        let mut report = task("report");
        report.title = "Write REPORT".into();
        let b = board(vec![task("x"), later, report]);
        let found = b.view(ScheduleDate::Today, "report", TaskSort::Priority);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "report");
        assert_eq!(b.view(ScheduleDate::Later, "", TaskSort::Newest).len(), 1);
    }

    #[test]
    fn day_complete_fires_once_on_transition() {
        let mut b = board(vec![task("a"), task("b")]);
        let today = now().date_naive();
        assert!(b.check_day_complete(today, false, now()).is_none());

        b.toggle_complete("a");
        assert!(b.check_day_complete(today, false, now()).is_none());
        b.toggle_complete("b");
        assert!(matches!(
            b.check_day_complete(today, false, now()),
            Some(Event::DailyReviewRequested { .. })
        ));

        // Reopen and finish again the same day: no second prompt.
        b.toggle_complete("b");
        b.check_day_complete(today, false, now());
        b.toggle_complete("b");
        assert!(b.check_day_complete(today, false, now()).is_none());
    }

    #[test]
    fn day_complete_suppressed_by_existing_review() {
        let mut b = board(vec![task("a")]);
        b.toggle_complete("a");
        assert!(b.check_day_complete(now().date_naive(), true, now()).is_none());
    }

    #[test]
    fn empty_board_never_prompts() {
        let mut b = board(vec![task("a")]);
        b.delete("a", now());
        assert!(b.check_day_complete(now().date_naive(), false, now()).is_none());
    }
}
