//! Task types and the task progression engine.
//!
//! A task accumulates completed pomodoros as Work sessions tied to it are
//! reviewed, and may depend on other tasks. A task with an existing,
//! incomplete prerequisite is *locked* and cannot become the active task.

pub mod assistant;
mod board;
pub mod template;

pub use board::{DeletedTask, TaskBoard, TaskUpdate, UNDO_WINDOW_SECS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, High first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        })
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScheduleDate {
    #[default]
    Today,
    Tomorrow,
    Later,
}

impl FromStr for ScheduleDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(ScheduleDate::Today),
            "tomorrow" => Ok(ScheduleDate::Tomorrow),
            "later" => Ok(ScheduleDate::Later),
            _ => Err(format!("unknown schedule date: {s}")),
        }
    }
}

/// Sort key for the task list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskSort {
    #[default]
    Priority,
    Newest,
    Oldest,
    Pomos,
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "priority" => Ok(TaskSort::Priority),
            "newest" => Ok(TaskSort::Newest),
            "oldest" => Ok(TaskSort::Oldest),
            "pomos" => Ok(TaskSort::Pomos),
            _ => Err(format!("unknown sort: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub estimated_pomos: u32,
    pub completed_pomos: u32,
    pub is_completed: bool,
    pub priority: Priority,
    pub is_pinned: bool,
    /// Creation time; tie-break for the Newest/Oldest sorts.
    pub created_at: DateTime<Utc>,
    pub schedule_date: ScheduleDate,
    /// Ids of prerequisite tasks.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Task {
    /// Create a fresh task after validating user input.
    pub fn new(
        title: &str,
        estimated_pomos: i64,
        priority: Priority,
        schedule_date: ScheduleDate,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = validate_title(title)?;
        let estimated_pomos = validate_estimate(estimated_pomos)?;
        Ok(Self {
            id: new_task_id(),
            title,
            estimated_pomos,
            completed_pomos: 0,
            is_completed: false,
            priority,
            is_pinned: false,
            created_at: now,
            schedule_date,
            depends_on: Vec::new(),
        })
    }

    /// Pomodoros still to do, never negative.
    pub fn pomos_left(&self) -> u32 {
        self.estimated_pomos.saturating_sub(self.completed_pomos)
    }

    /// Count one more completed pomodoro, completing the task once the
    /// estimate is reached.
    pub fn record_pomodoro(&mut self) {
        self.completed_pomos += 1;
        if self.completed_pomos >= self.estimated_pomos {
            self.is_completed = true;
        }
    }

    /// Drop progress, as on restore from the archive.
    pub fn reset_progress(&mut self) {
        self.completed_pomos = 0;
        self.is_completed = false;
    }
}

pub(crate) fn new_task_id() -> String {
    format!("task-{}", uuid::Uuid::new_v4())
}

pub(crate) fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_estimate(estimate: i64) -> Result<u32, ValidationError> {
    u32::try_from(estimate)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or(ValidationError::NonPositiveEstimate(estimate))
}

/// A task is locked iff some prerequisite exists in `all` and is not
/// completed. Ids of missing tasks never lock.
pub fn is_locked(task: &Task, all: &[Task]) -> bool {
    task.depends_on.iter().any(|dep_id| {
        all.iter()
            .find(|t| &t.id == dep_id)
            .is_some_and(|dep| !dep.is_completed)
    })
}

/// Ordering used by the task list: pinned first, then incomplete before
/// completed, then by `sort`.
pub fn compare_for_view(a: &Task, b: &Task, sort: TaskSort) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then(a.is_completed.cmp(&b.is_completed))
        .then_with(|| match sort {
            TaskSort::Priority => a.priority.rank().cmp(&b.priority.rank()),
            TaskSort::Newest => b.created_at.cmp(&a.created_at),
            TaskSort::Oldest => a.created_at.cmp(&b.created_at),
            TaskSort::Pomos => remaining(b).cmp(&remaining(a)),
        })
}

// Signed: over-completed tasks sort after untouched ones.
fn remaining(task: &Task) -> i64 {
    i64::from(task.estimated_pomos) - i64::from(task.completed_pomos)
}


#[cfg(test)]
mod tests {
    use super::test_support::{depending, task};
    use super::*;

    #[test]
    fn new_validates_input() {
        let now = Utc::now();
        assert_eq!(
            Task::new("   ", 1, Priority::High, ScheduleDate::Today, now).unwrap_err(),
            ValidationError::BlankTitle
        );
        assert_eq!(
            Task::new("Write", 0, Priority::High, ScheduleDate::Today, now).unwrap_err(),
            ValidationError::NonPositiveEstimate(0)
        );
        let t = Task::new("  Write report ", 3, Priority::High, ScheduleDate::Later, now).unwrap();
        assert_eq!(t.title, "Write report");
        assert_eq!(t.completed_pomos, 0);
        assert!(!t.is_completed);
        assert!(t.id.starts_with("task-"));
    }

    #[test]
    fn record_pomodoro_completes_at_estimate() {
        let mut t = task("a");
        t.record_pomodoro();
        assert!(!t.is_completed);
        t.record_pomodoro();
        assert!(t.is_completed);
        t.record_pomodoro();
        assert_eq!(t.completed_pomos, 3);
        assert_eq!(t.pomos_left(), 0);
    }

    #[test]
    fn locked_by_incomplete_existing_dependency() {
        let a = task("a");
        let b = depending("b", &["a"]);
        let all = vec![a.clone(), b.clone()];
        assert!(is_locked(&b, &all));

        let done = Task {
            is_completed: true,
            ..a
        };
        assert!(!is_locked(&b, &[done, b.clone()]));
    }

    #[test]
    fn missing_dependency_never_locks() {
        let b = depending("b", &["ghost"]);
        assert!(!is_locked(&b, std::slice::from_ref(&b)));
    }

    #[test]
    fn view_order_pinned_then_incomplete_then_priority() {
        let mut low = task("low");
        low.priority = Priority::Low;
        let mut high = task("high");
        high.priority = Priority::High;
        let mut pinned = task("pinned");
        pinned.priority = Priority::Low;
        pinned.is_pinned = true;
        let mut done = task("done");
        done.priority = Priority::High;
        done.is_completed = true;

        let mut all = vec![done, low, high, pinned];
        all.sort_by(|a, b| compare_for_view(a, b, TaskSort::Priority));
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["pinned", "high", "low", "done"]);
    }

    #[test]
    fn pomos_sort_puts_most_remaining_first() {
        let mut small = task("small");
        small.estimated_pomos = 1;
        let mut big = task("big");
        big.estimated_pomos = 5;
        let mut all = vec![small, big];
        all.sort_by(|a, b| compare_for_view(a, b, TaskSort::Pomos));
        assert_eq!(all[0].id, "big");
    }
}
