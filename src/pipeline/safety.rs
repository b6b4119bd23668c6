//! Safety status derived from the predicted safety class name.
//!
//! The mapping is a substring heuristic over the label name. Rules are checked in order and
//! the first hit wins, so a label containing both "no" and "active" maps to `Safe`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Safe,
    Alert,
    Monitor,
    Review,
    /// Safety screening did not run for this text.
    Unknown,
}

const SAFETY_RULES: &[(&[&str], SafetyStatus)] = &[
    (&["denied", "no"], SafetyStatus::Safe),
    (&["active"], SafetyStatus::Alert),
    (&["passive"], SafetyStatus::Monitor),
];

pub const SAFE_MESSAGE: &str = "No active SI/HI identified";
pub const ALERT_MESSAGE: &str = "ACTIVE SI/HI DETECTED - Requires immediate assessment";
pub const OVERALL_ALERT_MESSAGE: &str = "ALERT - Active SI/HI detected";
pub const OVERALL_MONITOR_MESSAGE: &str = "MONITOR - Passive ideation detected";

impl SafetyStatus {
    /// Maps a safety class name to a status; unmatched names need review.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        SAFETY_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, status)| *status)
            .unwrap_or(SafetyStatus::Review)
    }

    /// Alert and monitor findings are surfaced in summaries.
    pub fn is_alerting(self) -> bool {
        matches!(self, SafetyStatus::Alert | SafetyStatus::Monitor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyStatus::Safe => "safe",
            SafetyStatus::Alert => "alert",
            SafetyStatus::Monitor => "monitor",
            SafetyStatus::Review => "review",
            SafetyStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message shown by the flat pipeline: canned text for safe/alert, the raw label otherwise.
pub fn flat_safety_message(label: &str) -> String {
    match SafetyStatus::from_label(label) {
        SafetyStatus::Safe => SAFE_MESSAGE.to_string(),
        SafetyStatus::Alert => ALERT_MESSAGE.to_string(),
        _ => label.to_string(),
    }
}

/// Note-level safety verdict of the enhanced pipeline. Alert outranks monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSafety {
    Alert,
    Monitor,
    Clear,
}

impl OverallSafety {
    pub fn from_statuses(statuses: impl IntoIterator<Item = SafetyStatus>) -> Self {
        let mut overall = OverallSafety::Clear;
        for status in statuses {
            match status {
                SafetyStatus::Alert => return OverallSafety::Alert,
                SafetyStatus::Monitor => overall = OverallSafety::Monitor,
                _ => {}
            }
        }
        overall
    }

    pub fn message(self) -> &'static str {
        match self {
            OverallSafety::Alert => OVERALL_ALERT_MESSAGE,
            OverallSafety::Monitor => OVERALL_MONITOR_MESSAGE,
            OverallSafety::Clear => SAFE_MESSAGE,
        }
    }
}
