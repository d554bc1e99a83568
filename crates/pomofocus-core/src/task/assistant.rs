//! Task breakdown collaborator.
//!
//! Turns a free-text goal into proposed tasks. The generator itself is an
//! opaque [`TaskBreakdown`] implementation; this module only validates what it
//! returns and converts accepted proposals into board tasks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{new_task_id, Priority, ScheduleDate, Task};
use crate::error::AssistantError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedTask {
    pub title: String,
    pub estimated_pomos: u32,
    pub priority: Priority,
}

pub trait TaskBreakdown {
    fn generate(&self, prompt: &str) -> Result<Vec<ProposedTask>, AssistantError>;
}

/// Breakdown backed by a fixed JSON document, e.g. a saved response file.
pub struct JsonBreakdown {
    body: String,
}

impl JsonBreakdown {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl TaskBreakdown for JsonBreakdown {
    fn generate(&self, _prompt: &str) -> Result<Vec<ProposedTask>, AssistantError> {
        parse_breakdown(&self.body)
    }
}

/// Run `generator` for a non-blank prompt.
pub fn break_down(
    generator: &dyn TaskBreakdown,
    prompt: &str,
) -> Result<Vec<ProposedTask>, AssistantError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AssistantError::EmptyPrompt);
    }
    generator.generate(prompt)
}

/// Parse a `{"tasks": [...]}` response.
///
/// Entries with a missing or mistyped field, an unknown priority or a
/// non-positive estimate are dropped. A body without a `tasks` array is an
/// error.
pub fn parse_breakdown(body: &str) -> Result<Vec<ProposedTask>, AssistantError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
    let entries = value
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or_else(|| AssistantError::InvalidResponse("missing tasks array".into()))?;

    Ok(entries.iter().filter_map(proposal).collect())
}

fn proposal(entry: &Value) -> Option<ProposedTask> {
    let title = entry.get("title")?.as_str()?.trim();
    let estimate = entry.get("estimatedPomos")?.as_f64()?;
    let priority = match entry.get("priority")?.as_str()? {
        "High" => Priority::High,
        "Medium" => Priority::Medium,
        "Low" => Priority::Low,
        _ => return None,
    };
    if title.is_empty() || estimate < 1.0 || estimate > f64::from(u32::MAX) {
        return None;
    }
    Some(ProposedTask {
        title: title.to_string(),
        estimated_pomos: estimate.round() as u32,
        priority,
    })
}

/// Convert accepted proposals into unpinned Today tasks.
pub fn into_tasks(proposals: Vec<ProposedTask>, now: DateTime<Utc>) -> Vec<Task> {
    proposals
        .into_iter()
        .zip(0i64..)
        .map(|(p, index)| Task {
            id: new_task_id(),
            title: p.title,
            estimated_pomos: p.estimated_pomos,
            completed_pomos: 0,
            is_completed: false,
            priority: p.priority,
            is_pinned: false,
            created_at: now + Duration::milliseconds(index),
            schedule_date: ScheduleDate::Today,
            depends_on: Vec::new(),
        })
        .collect()
}
