//! End-of-day reviews and free-form journal entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::Mood;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReview {
    pub date: NaiveDate,
    pub went_well: String,
    pub improve: String,
    pub distractions: String,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    reviews: Vec<DailyReview>,
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(reviews: Vec<DailyReview>, entries: Vec<JournalEntry>) -> Self {
        Self { reviews, entries }
    }

    pub fn reviews(&self) -> &[DailyReview] {
        &self.reviews
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn has_review_for(&self, date: NaiveDate) -> bool {
        self.reviews.iter().any(|r| r.date == date)
    }

    pub fn entry_for(&self, date: NaiveDate) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.date == date)
    }

    /// Reviews accumulate; several for one day are kept as written.
    pub fn add_review(&mut self, review: DailyReview) {
        self.reviews.push(review);
    }

    /// Store `content` as the entry for `date`, replacing any earlier one.
    pub fn write_entry(&mut self, date: NaiveDate, content: impl Into<String>) {
        let content = content.into();
        match self.entries.iter_mut().find(|e| e.date == date) {
            Some(entry) => entry.content = content,
            None => self.entries.push(JournalEntry { date, content }),
        }
    }
}
