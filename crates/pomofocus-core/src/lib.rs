//! # Pomofocus Core Library
//!
//! Core logic for the Pomofocus Pomodoro timer: the session state machine and
//! its interaction with task progression, session logging and scheduling.
//! Everything is usable from the standalone `pomofocus` CLI.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven state machine over Work / Short Break / Long
//!   Break with an explicit review gate after every Work session
//! - **Session ledger**: append-only session, skip and distraction logs and
//!   the report aggregates derived from them
//! - **Task board**: task progress, dependency locks, soft delete with undo,
//!   archive, templates and the task breakdown collaborator
//! - **Estimate**: finish-time projection for today's remaining pomodoros
//! - **Storage**: JSON slots in SQLite and TOML settings
//!
//! ## Key Components
//!
//! - [`Pomofocus`]: facade owning every store and persisting after each command
//! - [`TimerEngine`]: the timer state machine
//! - [`TaskBoard`]: the task progression engine
//! - [`SessionLedger`]: session history
//! - [`Settings`]: user configuration

pub mod app;
pub mod error;
pub mod estimate;
pub mod events;
pub mod journal;
pub mod notify;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use app::Pomofocus;
pub use error::{AssistantError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use estimate::{estimate_finish, FinishEstimate};
pub use events::Event;
pub use journal::{DailyReview, Journal, JournalEntry};
pub use notify::{Notifier, SilentNotifier};
pub use session::{
    DistractionLog, EnergyLevel, FocusType, Mood, Reports, SessionAnnotations, SessionLedger,
    SessionLog, SkipReason, SkippedSessionLog,
};
pub use storage::{Database, Settings, Slot};
pub use task::{is_locked, Priority, ScheduleDate, Task, TaskBoard, TaskSort, TaskUpdate};
pub use timer::{format_clock, LastSession, Mode, TimerContext, TimerEngine, TimerPhase, TimerPosition};
