//! Log record types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::timer::Mode;

/// Session id: creation time in epoch milliseconds, bumped to stay monotonic.
pub type SessionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyLevel {
    High,
    Medium,
    Low,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 3] = [EnergyLevel::High, EnergyLevel::Medium, EnergyLevel::Low];
}

impl FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(EnergyLevel::High),
            "medium" => Ok(EnergyLevel::Medium),
            "low" => Ok(EnergyLevel::Low),
            _ => Err(format!("unknown energy level: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Ok,
    Bad,
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "ok" => Ok(Mood::Ok),
            "bad" => Ok(Mood::Bad),
            _ => Err(format!("unknown mood: {s}")),
        }
    }
}

/// What kind of work a session was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusType {
    Creative,
    Administrative,
    Learning,
    #[serde(rename = "Deep Work")]
    DeepWork,
    #[serde(rename = "Shallow Work")]
    ShallowWork,
    Planning,
}

impl FocusType {
    pub const ALL: [FocusType; 6] = [
        FocusType::Creative,
        FocusType::Administrative,
        FocusType::Learning,
        FocusType::DeepWork,
        FocusType::ShallowWork,
        FocusType::Planning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FocusType::Creative => "Creative",
            FocusType::Administrative => "Administrative",
            FocusType::Learning => "Learning",
            FocusType::DeepWork => "Deep Work",
            FocusType::ShallowWork => "Shallow Work",
            FocusType::Planning => "Planning",
        }
    }
}

impl FromStr for FocusType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace(['-', '_'], " ");
        FocusType::ALL
            .into_iter()
            .find(|f| f.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown focus type: {s}"))
    }
}

/// Why a session was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    #[serde(rename = "Unexpected meeting")]
    UnexpectedMeeting,
    Fatigued,
    #[serde(rename = "Chose to work longer")]
    ChoseToWorkLonger,
    Interrupted,
    #[serde(rename = "Not needed")]
    NotNeeded,
}

impl SkipReason {
    pub const ALL: [SkipReason; 5] = [
        SkipReason::UnexpectedMeeting,
        SkipReason::Fatigued,
        SkipReason::ChoseToWorkLonger,
        SkipReason::Interrupted,
        SkipReason::NotNeeded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SkipReason::UnexpectedMeeting => "Unexpected meeting",
            SkipReason::Fatigued => "Fatigued",
            SkipReason::ChoseToWorkLonger => "Chose to work longer",
            SkipReason::Interrupted => "Interrupted",
            SkipReason::NotNeeded => "Not needed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SkipReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace(['-', '_'], " ");
        SkipReason::ALL
            .into_iter()
            .find(|r| r.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown skip reason: {s}"))
    }
}

/// Optional post-session annotations collected by the review step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_type: Option<FocusType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl SessionAnnotations {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.focus_type.is_none()
            && self.energy_level.is_none()
            && self.mood.is_none()
    }
}

/// One timer run. Created in-progress when the countdown starts and
/// flipped to `completed` when it reaches zero. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    pub id: SessionId,
    pub date: NaiveDate,
    pub mode: Mode,
    /// Planned duration in seconds.
    pub duration: u64,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_type: Option<FocusType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl SessionLog {
    /// Merge provided annotations; absent fields leave existing values.
    pub fn merge(&mut self, annotations: &SessionAnnotations) {
        if let Some(label) = &annotations.label {
            self.label = Some(label.clone());
        }
        if annotations.focus_type.is_some() {
            self.focus_type = annotations.focus_type;
        }
        if annotations.energy_level.is_some() {
            self.energy_level = annotations.energy_level;
        }
        if annotations.mood.is_some() {
            self.mood = annotations.mood;
        }
    }

    pub fn is_completed_work(&self) -> bool {
        self.completed && self.mode == Mode::Work
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSessionLog {
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractionLog {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> SessionLog {
        SessionLog {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            mode: Mode::Work,
            duration: 1500,
            completed: true,
            task_id: None,
            label: Some("old".into()),
            focus_type: None,
            energy_level: Some(EnergyLevel::Low),
            mood: None,
        }
    }

    #[test]
    fn merge_keeps_unspecified_fields() {
        let mut l = log();
        l.merge(&SessionAnnotations {
            focus_type: Some(FocusType::DeepWork),
            ..Default::default()
        });
        assert_eq!(l.label.as_deref(), Some("old"));
        assert_eq!(l.focus_type, Some(FocusType::DeepWork));
        assert_eq!(l.energy_level, Some(EnergyLevel::Low));
    }

    #[test]
    fn session_log_json_shape() {
        let json = serde_json::to_value(log()).unwrap();
        assert_eq!(json["mode"], "Work");
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["energyLevel"], "Low");
        assert!(json.get("taskId").is_none());
    }

    #[test]
    fn skip_reason_parse_and_serde() {
        assert_eq!("fatigued".parse::<SkipReason>().unwrap(), SkipReason::Fatigued);
        assert_eq!(
            "not-needed".parse::<SkipReason>().unwrap(),
            SkipReason::NotNeeded
        );
        assert!("bored".parse::<SkipReason>().is_err());
        assert_eq!(
            serde_json::to_string(&SkipReason::UnexpectedMeeting).unwrap(),
            "\"Unexpected meeting\""
        );
    }

    #[test]
    fn annotation_values_parse_leniently() {
        assert_eq!("deep-work".parse::<FocusType>().unwrap(), FocusType::DeepWork);
        assert_eq!("GREAT".parse::<Mood>().unwrap(), Mood::Great);
        assert_eq!("low".parse::<EnergyLevel>().unwrap(), EnergyLevel::Low);
        assert!("sleepy".parse::<Mood>().is_err());
    }
}
