//! TOML-based application settings.
//!
//! Stores user preferences including:
//! - Work / short break / long break durations and the long-break interval
//! - Auto-start behaviour for breaks and pomodoros
//! - Alarm and soundscape choices
//! - Daily goal, language and accessibility options
//!
//! Settings are stored at `<data dir>/config.toml`. A single instance is
//! threaded by reference into every duration computation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    De,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemePalette {
    #[default]
    Default,
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Application settings.
///
/// Durations are in minutes; `long_break_interval` is the number of work
/// sessions per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_pomodoro")]
    pub pomodoro: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomos: bool,
    #[serde(default = "default_true")]
    pub auto_switch_tasks: bool,
    #[serde(default = "default_alarm_sound")]
    pub alarm_sound: String,
    #[serde(default = "default_volume")]
    pub alarm_volume: f32,
    #[serde(default = "default_true")]
    pub alarm_fade_in: bool,
    #[serde(default = "default_soundscape")]
    pub soundscape: String,
    #[serde(default = "default_volume")]
    pub soundscape_volume: f32,
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default)]
    pub is_premium: bool,
    /// Do-not-disturb: alarms are suppressed.
    #[serde(default)]
    pub dnd_mode: bool,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_break_suggestions")]
    pub custom_break_suggestions: Vec<String>,
    #[serde(default)]
    pub theme_palette: ThemePalette,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default)]
    pub reduced_motion: bool,
}

fn default_pomodoro() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_alarm_sound() -> String {
    "bell".into()
}
fn default_volume() -> f32 {
    0.5
}
fn default_soundscape() -> String {
    "none".into()
}
fn default_theme_color() -> String {
    "red".into()
}
fn default_daily_goal() -> u32 {
    8
}
fn default_break_suggestions() -> Vec<String> {
    [
        "Stretch your neck",
        "Refill your water",
        "Do 10 jumping jacks",
        "Breathe deeply for 1 minute",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pomodoro: default_pomodoro(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            long_break_interval: default_long_break_interval(),
            auto_start_breaks: false,
            auto_start_pomos: false,
            auto_switch_tasks: true,
            alarm_sound: default_alarm_sound(),
            alarm_volume: default_volume(),
            alarm_fade_in: true,
            soundscape: default_soundscape(),
            soundscape_volume: default_volume(),
            theme_color: default_theme_color(),
            daily_goal: default_daily_goal(),
            is_premium: false,
            dnd_mode: false,
            language: Language::default(),
            custom_break_suggestions: default_break_suggestions(),
            theme_palette: ThemePalette::default(),
            font_size: FontSize::default(),
            reduced_motion: false,
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default settings file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from `path` or create it with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default file cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                settings.validate()?;
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by key. The new value is typed after the
    /// current one and the whole bag is re-validated before it is applied.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Range checks that keep duration arithmetic well defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("pomodoro", self.pomodoro),
            ("short_break", self.short_break),
            ("long_break", self.long_break),
            ("long_break_interval", self.long_break_interval),
            ("daily_goal", self.daily_goal),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".into(),
                });
            }
        }
        for (key, volume) in [
            ("alarm_volume", self.alarm_volume),
            ("soundscape_volume", self.soundscape_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{volume} is outside 0.0..=1.0"),
                });
            }
        }
        Ok(())
    }

    /// Work sessions per cycle, never zero.
    pub fn cycle_length(&self) -> u32 {
        self.long_break_interval.max(1)
    }

    /// Pick a random break activity from the custom list.
    pub fn break_suggestion<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.custom_break_suggestions.choose(rng).map(String::as_str)
    }
}
