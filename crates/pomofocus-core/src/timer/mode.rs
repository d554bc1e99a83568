use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::storage::Settings;

/// Timer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Work,
    #[serde(rename = "Short Break")]
    ShortBreak,
    #[serde(rename = "Long Break")]
    LongBreak,
}

impl Mode {
    /// Configured length of this mode in minutes.
    pub fn duration_min(self, settings: &Settings) -> u64 {
        let minutes = match self {
            Mode::Work => settings.pomodoro,
            Mode::ShortBreak => settings.short_break,
            Mode::LongBreak => settings.long_break,
        };
        u64::from(minutes)
    }

    /// Configured length of this mode in seconds.
    pub fn duration_secs(self, settings: &Settings) -> u64 {
        self.duration_min(settings).saturating_mul(60)
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Work)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "work" | "pomodoro" => Ok(Mode::Work),
            "shortbreak" | "short" => Ok(Mode::ShortBreak),
            "longbreak" | "long" => Ok(Mode::LongBreak),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
