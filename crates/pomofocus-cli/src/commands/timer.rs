use chrono::Utc;
use clap::Subcommand;
use pomofocus_core::{
    format_clock, EnergyLevel, Event, FocusType, Mode, Mood, Notifier, Pomofocus, SessionAnnotations,
    SkipReason,
};
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;

use super::{print_json, report_events, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground until it goes idle.
    ///
    /// While running, type `p` to pause or resume, `d [reason]` to log a
    /// distraction, `s [reason]` to skip, `r` to reset and `q` to suspend
    /// and quit.
    Run {
        /// Resolve post-session reviews without prompting
        #[arg(long)]
        no_review: bool,
        /// Tick interval in milliseconds
        #[arg(long, default_value_t = 1000, hide = true)]
        tick_ms: u64,
    },
    /// Print current timer state as JSON
    Status,
    /// Stop and refill the countdown for the current mode
    Reset,
    /// Abandon the current session
    Skip {
        /// One of: unexpected-meeting, fatigued, chose-to-work-longer, interrupted, not-needed
        #[arg(long, default_value = "not-needed")]
        reason: SkipReason,
    },
    /// Switch mode (work, short-break, long-break)
    Mode {
        mode: Mode,
        /// Start the countdown right away
        #[arg(long)]
        start: bool,
    },
}

/// Alarm as a terminal bell. Soundscapes are only logged.
struct TerminalBell;

impl Notifier for TerminalBell {
    fn play_alarm(&self, sound: &str, volume: f32, _fade_in: bool) -> io::Result<()> {
        tracing::debug!(sound, volume, "alarm");
        if volume <= 0.0 {
            return Ok(());
        }
        let mut err = io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()
    }

    fn set_soundscape(&self, soundscape: &str, volume: f32, playing: bool) -> io::Result<()> {
        tracing::info!(soundscape, volume, playing, "soundscape");
        Ok(())
    }
}

fn open_app() -> Result<Pomofocus, Box<dyn std::error::Error>> {
    let mut app = Pomofocus::open()?;
    app.set_notifier(Box::new(TerminalBell));
    Ok(app)
}

pub fn run(action: TimerAction) -> CmdResult {
    let now = Utc::now();
    match action {
        TimerAction::Run { no_review, tick_ms } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            return runtime.block_on(run_foreground(no_review, tick_ms));
        }
        TimerAction::Status => {
            let app = open_app()?;
            return match app.saved_session(now) {
                Some(saved) => print_json(&saved),
                None => print_json(&app.status(now)),
            };
        }
        TimerAction::Reset => {
            let mut app = open_app()?;
            app.resume(now);
            app.reset(now);
            finish(&mut app)?;
        }
        TimerAction::Skip { reason } => {
            let mut app = open_app()?;
            app.resume(now);
            app.skip(reason, now);
            finish(&mut app)?;
        }
        TimerAction::Mode { mode, start } => {
            let mut app = open_app()?;
            app.resume(now);
            app.switch_mode(mode, start, now);
            if app.timer().mode() != mode {
                return Err("timer is running in another mode; skip or reset it first".into());
            }
            finish(&mut app)?;
        }
    }
    Ok(())
}

/// Log a distraction against a resumed Work session.
pub fn distraction(reason: Option<String>) -> CmdResult {
    let now = Utc::now();
    let mut app = open_app()?;
    app.resume(now);
    let entry = app
        .log_distraction(reason, now)
        .ok_or("no Work session is running")?;
    app.suspend(now)?;
    report_events(&mut app);
    print_json(&entry)
}

fn finish(app: &mut Pomofocus) -> CmdResult {
    let now = Utc::now();
    app.suspend(now)?;
    report_events(app);
    print_json(&app.status(now))
}

/// Print events as JSON lines; notices go to stderr.
fn emit(app: &mut Pomofocus) -> CmdResult {
    let mut out = io::stdout().lock();
    for event in app.take_events() {
        match &event {
            Event::Notice { message, .. } => eprintln!("{message}"),
            _ => writeln!(out, "{}", serde_json::to_string(&event)?)?,
        }
    }
    out.flush()?;
    Ok(())
}

async fn run_foreground(no_review: bool, tick_ms: u64) -> CmdResult {
    let mut app = open_app()?;
    app.resume(Utc::now());
    app.start(Utc::now());
    emit(&mut app)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut paused = false;
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => app.tick(Utc::now()),
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_line(&mut app, line.trim(), &mut paused) {
                        break;
                    }
                }
                None => stdin_open = false,
            },
            _ = &mut ctrl_c => break,
        }
        emit(&mut app)?;

        if app.timer().is_awaiting_review() {
            let annotations = if no_review || !stdin_open {
                None
            } else {
                prompt_review(&mut lines, &mut stdin_open).await?
            };
            app.continue_after_review(annotations, Utc::now());
            emit(&mut app)?;
            if let Some(idea) = app.break_suggestion(&mut rand::thread_rng()) {
                eprintln!("Break idea: {idea}");
            }
        }

        if !app.timer().is_active() && (!paused || !stdin_open) {
            break;
        }
    }

    app.suspend(Utc::now())?;
    if app.timer().is_active() {
        eprintln!(
            "suspended at {} ({}); run again within 5 minutes to resume",
            format_clock(app.timer().seconds_left()),
            app.timer().mode()
        );
    }
    Ok(())
}

/// Apply one interactive command. Returns false to quit.
fn handle_line(app: &mut Pomofocus, line: &str, paused: &mut bool) -> bool {
    let now = Utc::now();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match cmd {
        "" => {}
        "p" | "pause" | "resume" => {
            app.toggle(now);
            *paused = !app.timer().is_active();
        }
        "d" | "distraction" => {
            let reason = (!rest.is_empty()).then(|| rest.to_string());
            if app.log_distraction(reason, now).is_none() {
                eprintln!("no Work session is running");
            }
        }
        "s" | "skip" => {
            let reason = rest.parse().unwrap_or(SkipReason::NotNeeded);
            app.skip(reason, now);
            *paused = false;
        }
        "r" | "reset" => {
            app.reset(now);
            *paused = true;
        }
        "q" | "quit" => return false,
        other => eprintln!("unknown command: {other} (p, d, s, r, q)"),
    }
    true
}

async fn prompt_review(
    lines: &mut Lines<BufReader<Stdin>>,
    stdin_open: &mut bool,
) -> Result<Option<SessionAnnotations>, Box<dyn std::error::Error>> {
    eprintln!("Session complete. Describe it (focus=.. energy=.. mood=.. label=..) or press enter to skip:");
    match lines.next_line().await? {
        Some(line) => Ok(parse_review(&line)),
        None => {
            *stdin_open = false;
            Ok(None)
        }
    }
}

/// Parse `key=value` pairs. `label=` takes the rest of the line.
fn parse_review(line: &str) -> Option<SessionAnnotations> {
    let (fields, label) = match line.find("label=") {
        Some(at) => (&line[..at], Some(line[at + "label=".len()..].trim())),
        None => (line, None),
    };
    let mut notes = SessionAnnotations {
        label: label.filter(|l| !l.is_empty()).map(str::to_string),
        ..Default::default()
    };
    for pair in fields.split_whitespace() {
        let Some((key, value)) = pair.split_once('=') else {
            eprintln!("ignoring '{pair}'");
            continue;
        };
        let parsed = match key {
            "focus" => value.parse::<FocusType>().map(|v| notes.focus_type = Some(v)),
            "energy" => value.parse::<EnergyLevel>().map(|v| notes.energy_level = Some(v)),
            "mood" => value.parse::<Mood>().map(|v| notes.mood = Some(v)),
            _ => Err(format!("unknown field: {key}")),
        };
        if let Err(e) = parsed {
            eprintln!("ignoring {e}");
        }
    }
    (!notes.is_empty()).then_some(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_line_parsing() {
        let notes = parse_review("focus=deep-work energy=high label=Outline chapter 3").unwrap();
        assert_eq!(notes.focus_type, Some(FocusType::DeepWork));
        assert_eq!(notes.energy_level, Some(EnergyLevel::High));
        assert_eq!(notes.label.as_deref(), Some("Outline chapter 3"));
        assert!(parse_review("").is_none());
        assert!(parse_review("mood=sleepy").is_none());
    }
}
