//! Reusable task templates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{new_task_id, Priority, ScheduleDate, Task};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTask {
    pub title: String,
    pub estimated_pomos: u32,
    pub priority: Priority,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TemplateTask>,
}

impl Template {
    /// Capture the shape of the selected tasks under `name`.
    pub fn from_tasks<'a>(
        name: &str,
        selection: impl IntoIterator<Item = &'a Task>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        let tasks: Vec<TemplateTask> = selection
            .into_iter()
            .map(|t| TemplateTask {
                title: t.title.clone(),
                estimated_pomos: t.estimated_pomos,
                priority: t.priority,
                is_pinned: t.is_pinned,
            })
            .collect();
        if name.is_empty() || tasks.is_empty() {
            return Err(ValidationError::EmptyTemplate);
        }
        Ok(Self {
            id: format!("template-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            tasks,
        })
    }

    /// Fresh Today tasks, one per entry, in template order.
    pub fn instantiate(&self, now: DateTime<Utc>) -> Vec<Task> {
        self.tasks
            .iter()
            .zip(0i64..)
            .map(|(entry, index)| Task {
                id: new_task_id(),
                title: entry.title.clone(),
                estimated_pomos: entry.estimated_pomos.max(1),
                completed_pomos: 0,
                is_completed: false,
                priority: entry.priority,
                is_pinned: entry.is_pinned,
                created_at: now + Duration::milliseconds(index),
                schedule_date: ScheduleDate::Today,
                depends_on: Vec::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::test_support::{depending, task};

    #[test]
    fn save_requires_name_and_selection() {
        let a = task("a");
        assert_eq!(
            Template::from_tasks("  ", [&a]).unwrap_err(),
            ValidationError::EmptyTemplate
        );
        assert_eq!(
            Template::from_tasks("Morning", std::iter::empty()).unwrap_err(),
            ValidationError::EmptyTemplate
        );
    }

    #[test]
    fn apply_creates_fresh_today_tasks() {
        let mut a = task("a");
        a.completed_pomos = 1;
        a.is_pinned = true;
        a.schedule_date = ScheduleDate::Later;
        let b = depending("b", &["a"]);
        let template = Template::from_tasks(" Morning ", [&a, &b]).unwrap();
        assert_eq!(template.name, "Morning");

        let now = Utc::now();
        let tasks = template.instantiate(now);
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.completed_pomos == 0
            && !t.is_completed
            && t.schedule_date == ScheduleDate::Today
            && t.depends_on.is_empty()));
        assert!(tasks[0].is_pinned);
        assert_eq!(tasks[1].created_at - tasks[0].created_at, Duration::milliseconds(1));
        assert_ne!(tasks[0].id, tasks[1].id);
    }
}
