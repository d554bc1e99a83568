//! Session ledger: session attempts, skips and distractions, plus the
//! aggregates derived from them.

mod ledger;
mod log;
mod report;

pub use ledger::SessionLedger;
pub use log::{
    DistractionLog, EnergyLevel, FocusType, Mood, SessionAnnotations, SessionId, SessionLog,
    SkipReason, SkippedSessionLog,
};
pub use report::{Breakdown, HeatmapDay, ReportSummary, Reports};
