//! End-of-day review and journal commands.

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use pomofocus_core::{DailyReview, Mood, Pomofocus};

use super::{print_json, report_events, CmdResult};

#[derive(Args)]
pub struct ReviewArgs {
    /// What went well today
    #[arg(long, default_value = "")]
    went_well: String,
    /// What to improve tomorrow
    #[arg(long, default_value = "")]
    improve: String,
    /// What distracted you
    #[arg(long, default_value = "")]
    distractions: String,
    /// great, good, ok or bad
    #[arg(long, default_value = "ok")]
    mood: Mood,
}

#[derive(Subcommand)]
pub enum JournalAction {
    /// Write today's entry, replacing any earlier one
    Write {
        /// Entry text
        content: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show reviews and the entry for a day
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn review(args: ReviewArgs) -> CmdResult {
    let mut app = Pomofocus::open()?;
    let now = Utc::now();
    let review = DailyReview {
        date: now.date_naive(),
        went_well: args.went_well,
        improve: args.improve,
        distractions: args.distractions,
        mood: args.mood,
    };
    app.save_daily_review(review.clone(), now);
    report_events(&mut app);
    print_json(&review)
}

pub fn run(action: JournalAction) -> CmdResult {
    let mut app = Pomofocus::open()?;
    let now = Utc::now();

    match action {
        JournalAction::Write { content, date } => {
            let date = date.unwrap_or_else(|| now.date_naive());
            app.write_journal(date, &content, now);
            print_json(&app.journal().entry_for(date))?;
        }
        JournalAction::Show { date } => {
            let date = date.unwrap_or_else(|| now.date_naive());
            let journal = app.journal();
            let reviews: Vec<&DailyReview> = journal.reviews().iter().filter(|r| r.date == date).collect();
            print_json(&serde_json::json!({
                "date": date,
                "reviews": reviews,
                "entry": journal.entry_for(date),
            }))?;
        }
    }

    report_events(&mut app);
    Ok(())
}
