//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use pomofocus_core::task::assistant::JsonBreakdown;
use pomofocus_core::{Pomofocus, Priority, ScheduleDate, Task, TaskSort, TaskUpdate};
use serde::Serialize;
use std::path::PathBuf;

use super::{print_json, report_events, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Estimated pomodoros
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        estimate: i64,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// today, tomorrow or later
        #[arg(long, default_value = "today")]
        schedule: ScheduleDate,
    },
    /// List tasks
    List {
        /// today, tomorrow or later
        #[arg(long, default_value = "today")]
        schedule: ScheduleDate,
        /// Case-insensitive title filter
        #[arg(long, default_value = "")]
        search: String,
        /// priority, newest, oldest or pomos
        #[arg(long, default_value = "priority")]
        sort: TaskSort,
        /// List the archive instead
        #[arg(long)]
        archived: bool,
    },
    /// Edit a task
    Edit {
        /// Task ID (or unique prefix)
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        estimate: Option<i64>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        schedule: Option<ScheduleDate>,
    },
    /// Make a task the active one
    Activate { id: String },
    /// Toggle completion
    Done { id: String },
    /// Toggle pin
    Pin { id: String },
    /// Delete a task (undoable for a few seconds)
    Delete { id: String },
    /// Bring back the last deleted task
    Undo,
    /// Move a task to the archive
    Archive { id: String },
    /// Restore a task from the archive
    Restore { id: String },
    /// Delete an archived task for good
    Purge { id: String },
    /// Replace a task's prerequisites
    Depend {
        id: String,
        /// Prerequisite task IDs; none clears them
        on: Vec<String>,
    },
    /// Add tasks from a breakdown response (`{"tasks": [...]}`)
    Import {
        /// JSON file with the response
        #[arg(long)]
        file: PathBuf,
        /// The goal the breakdown was generated for
        #[arg(long)]
        prompt: String,
    },
}

#[derive(Serialize)]
struct TaskRow<'a> {
    #[serde(flatten)]
    task: &'a Task,
    locked: bool,
    active: bool,
}

/// Resolve an exact id or a unique id prefix.
fn resolve(tasks: &[Task], id: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(task) = tasks.iter().find(|t| t.id == id) {
        return Ok(task.id.clone());
    }
    let mut matches = tasks.iter().filter(|t| t.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id.clone()),
        (Some(_), Some(_)) => Err(format!("ambiguous task id: {id}").into()),
        (None, _) => Err(format!("task not found: {id}").into()),
    }
}

fn require(changed: bool, what: &str) -> CmdResult {
    if changed {
        Ok(())
    } else {
        Err(what.into())
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut app = Pomofocus::open()?;
    let now = Utc::now();

    match action {
        TaskAction::Add {
            title,
            estimate,
            priority,
            schedule,
        } => {
            let task = app.add_task(&title, estimate, priority, schedule, now)?;
            print_json(&task)?;
        }
        TaskAction::List {
            schedule,
            search,
            sort,
            archived,
        } => {
            if archived {
                print_json(app.board().archived())?;
            } else {
                let board = app.board();
                let rows: Vec<TaskRow> = board
                    .view(schedule, &search, sort)
                    .into_iter()
                    .map(|task| TaskRow {
                        task,
                        locked: board.is_locked(task),
                        active: board.active_task_id() == Some(task.id.as_str()),
                    })
                    .collect();
                print_json(&rows)?;
            }
        }
        TaskAction::Edit {
            id,
            title,
            estimate,
            priority,
            schedule,
        } => {
            let id = resolve(app.board().tasks(), &id)?;
            let update = TaskUpdate {
                title,
                estimated_pomos: estimate,
                priority,
                schedule_date: schedule,
                depends_on: None,
            };
            app.update_task(&id, update, now)?;
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Activate { id } => {
            let id = resolve(app.board().tasks(), &id)?;
            require(
                app.set_active_task(&id, now),
                "task is completed or waiting on an unfinished prerequisite",
            )?;
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Done { id } => {
            let id = resolve(app.board().tasks(), &id)?;
            app.toggle_complete(&id, now);
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Pin { id } => {
            let id = resolve(app.board().tasks(), &id)?;
            app.toggle_pin(&id, now);
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Delete { id } => {
            let id = resolve(app.board().tasks(), &id)?;
            app.delete_task(&id, now);
            print_json(&app.board().last_deleted())?;
        }
        TaskAction::Undo => {
            require(app.undo_delete(now), "nothing to undo")?;
            println!("restored");
        }
        TaskAction::Archive { id } => {
            let id = resolve(app.board().tasks(), &id)?;
            app.archive_task(&id, now);
            println!("archived {id}");
        }
        TaskAction::Restore { id } => {
            let id = resolve(app.board().archived(), &id)?;
            app.restore_task(&id, now);
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Purge { id } => {
            let id = resolve(app.board().archived(), &id)?;
            app.purge_task(&id, now);
            println!("deleted {id}");
        }
        TaskAction::Depend { id, on } => {
            let tasks = app.board().tasks();
            let id = resolve(tasks, &id)?;
            let deps = on
                .iter()
                .map(|dep| resolve(tasks, dep))
                .collect::<Result<Vec<_>, _>>()?;
            let update = TaskUpdate {
                depends_on: Some(deps),
                ..Default::default()
            };
            app.update_task(&id, update, now)?;
            print_json(&app.board().get(&id))?;
        }
        TaskAction::Import { file, prompt } => {
            let body = std::fs::read_to_string(&file)?;
            let added = app.import_breakdown(&JsonBreakdown::new(body), &prompt, now)?;
            println!("added {added} tasks");
        }
    }

    report_events(&mut app);
    Ok(())
}
