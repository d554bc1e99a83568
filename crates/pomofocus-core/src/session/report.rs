//! Report aggregates derived from the session ledger.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::SessionLedger;
use super::log::{EnergyLevel, FocusType};
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub pomodoros_done: usize,
    pub minutes_focused: u64,
    pub tasks_completed: usize,
    pub completed_today: usize,
    pub daily_goal: u32,
    pub day_streak: u32,
    pub distractions: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown<K> {
    pub key: K,
    pub count: usize,
}

/// Read-only report view over a ledger.
pub struct Reports<'a> {
    ledger: &'a SessionLedger,
}

impl<'a> Reports<'a> {
    pub fn new(ledger: &'a SessionLedger) -> Self {
        Self { ledger }
    }

    pub fn summary(&self, tasks: &[Task], today: NaiveDate, daily_goal: u32) -> ReportSummary {
        let completed: Vec<_> = self
            .ledger
            .sessions()
            .iter()
            .filter(|s| s.is_completed_work())
            .collect();
        let focus_secs: u64 = completed.iter().map(|s| s.duration).sum();
        ReportSummary {
            pomodoros_done: completed.len(),
            minutes_focused: (focus_secs + 30) / 60,
            tasks_completed: tasks.iter().filter(|t| t.is_completed).count(),
            completed_today: self.ledger.completed_work_on(today),
            daily_goal,
            day_streak: self.day_streak(today),
            distractions: self.ledger.distractions().len(),
            skipped: self.ledger.skipped().len(),
        }
    }

    fn per_day(&self) -> BTreeMap<NaiveDate, usize> {
        let mut counts = BTreeMap::new();
        for log in self.ledger.sessions().iter().filter(|s| s.is_completed_work()) {
            *counts.entry(log.date).or_insert(0) += 1;
        }
        counts
    }

    /// Completed Work sessions per day for the `days` days ending `today`,
    /// oldest first.
    pub fn heatmap(&self, today: NaiveDate, days: u32) -> Vec<HeatmapDay> {
        let counts = self.per_day();
        (0..i64::from(days))
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                HeatmapDay {
                    date,
                    count: counts.get(&date).copied().unwrap_or(0),
                }
            })
            .collect()
    }

    /// Consecutive days with at least one completed Work session, ending
    /// today, or yesterday when nothing has been completed yet today.
    pub fn day_streak(&self, today: NaiveDate) -> u32 {
        let counts = self.per_day();
        let mut day = if counts.contains_key(&today) {
            today
        } else {
            today - Duration::days(1)
        };
        let mut streak = 0;
        while counts.contains_key(&day) {
            streak += 1;
            day = day - Duration::days(1);
        }
        streak
    }

    /// Completed Work sessions per focus type; types never used are omitted.
    pub fn focus_breakdown(&self) -> Vec<Breakdown<FocusType>> {
        FocusType::ALL
            .into_iter()
            .map(|key| Breakdown {
                key,
                count: self
                    .ledger
                    .sessions()
                    .iter()
                    .filter(|s| s.is_completed_work() && s.focus_type == Some(key))
                    .count(),
            })
            .filter(|b| b.count > 0)
            .collect()
    }

    pub fn energy_breakdown(&self) -> Vec<Breakdown<EnergyLevel>> {
        EnergyLevel::ALL
            .into_iter()
            .map(|key| Breakdown {
                key,
                count: self
                    .ledger
                    .sessions()
                    .iter()
                    .filter(|s| s.is_completed_work() && s.energy_level == Some(key))
                    .count(),
            })
            .filter(|b| b.count > 0)
            .collect()
    }
}
