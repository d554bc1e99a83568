use chrono::Utc;
use clap::Subcommand;
use pomofocus_core::Pomofocus;
use serde_json::json;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, today's progress against the daily goal and the day streak
    Summary,
    /// Completed pomodoros per day
    Heatmap {
        /// Number of days ending today
        #[arg(long, default_value_t = 90)]
        days: u32,
    },
    /// Completed pomodoros by focus type and energy level
    Breakdown,
}

pub fn run(action: StatsAction) -> CmdResult {
    let app = Pomofocus::open()?;
    let reports = app.reports();
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Summary => {
            print_json(&reports.summary(app.board().tasks(), today, app.settings().daily_goal))?;
        }
        StatsAction::Heatmap { days } => print_json(&reports.heatmap(today, days))?,
        StatsAction::Breakdown => print_json(&json!({
            "focus": reports.focus_breakdown(),
            "energy": reports.energy_breakdown(),
        }))?,
    }
    Ok(())
}

/// Print the projected finish for today's remaining work, or `null`.
pub fn estimate() -> CmdResult {
    let app = Pomofocus::open()?;
    print_json(&app.estimate(Utc::now()))
}
