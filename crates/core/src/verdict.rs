//! Decoded verdicts: the terminal lifecycle state per monitored item and
//! any lifecycle-rule violations observed along its state history.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle-rule violation kinds, labels preserved verbatim from the
/// rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Completed without the required preceding activation; every entry
    /// sentry of the item was bypassed
    #[serde(rename = "readyToCompleted")]
    ReadyToCompleted,

    /// Completed while never activated
    #[serde(rename = "inactiveToCompleted")]
    InactiveToCompleted,

    /// A required item never reached completion before its container
    /// concluded
    #[serde(rename = "mandatoryNotDone")]
    MandatoryNotDone,

    #[serde(rename = "mandatoryLastNotDone")]
    MandatoryLastNotDone,

    /// A non-repeating item completed more than once
    #[serde(rename = "nonRepetitiveMultipleCompleted")]
    NonRepetitiveMultipleCompleted,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::ReadyToCompleted => "readyToCompleted",
            ViolationKind::InactiveToCompleted => "inactiveToCompleted",
            ViolationKind::MandatoryNotDone => "mandatoryNotDone",
            ViolationKind::MandatoryLastNotDone => "mandatoryLastNotDone",
            ViolationKind::NonRepetitiveMultipleCompleted => "nonRepetitiveMultipleCompleted",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "readyToCompleted" => Some(ViolationKind::ReadyToCompleted),
            "inactiveToCompleted" => Some(ViolationKind::InactiveToCompleted),
            "mandatoryNotDone" => Some(ViolationKind::MandatoryNotDone),
            "mandatoryLastNotDone" => Some(ViolationKind::MandatoryLastNotDone),
            "nonRepetitiveMultipleCompleted" => Some(ViolationKind::NonRepetitiveMultipleCompleted),
            _ => None,
        }
    }
}

/// One entry of an item's state history as reported by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateEntry {
    /// State reached, nothing fired
    Plain { state: String },

    /// State reached together with a violation that fired under it
    Violated { state: String, kind: ViolationKind },
}

impl StateEntry {
    pub fn state(&self) -> &str {
        match self {
            StateEntry::Plain { state } | StateEntry::Violated { state, .. } => state,
        }
    }

    pub fn violation(&self) -> Option<ViolationKind> {
        match self {
            StateEntry::Plain { .. } => None,
            StateEntry::Violated { kind, .. } => Some(*kind),
        }
    }
}

/// A violation together with the state it was observed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub state: String,
}

/// Verdict for one monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemVerdict {
    /// Last lifecycle state reached
    pub final_state: String,

    /// Violations accumulated across the state history, in history order
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// All item verdicts for one case. Built once per reasoning run,
/// read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub case_id: String,
    pub items: BTreeMap<String, ItemVerdict>,
}

impl CaseVerdict {
    pub fn violation_count(&self) -> usize {
        self.items.values().map(|v| v.violations.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_kind_labels_round_trip() {
        let kinds = [
            ViolationKind::ReadyToCompleted,
            ViolationKind::InactiveToCompleted,
            ViolationKind::MandatoryNotDone,
            ViolationKind::MandatoryLastNotDone,
            ViolationKind::NonRepetitiveMultipleCompleted,
        ];
        for kind in kinds {
            assert_eq!(ViolationKind::from_label(kind.as_str()), Some(kind));
        }
        assert_eq!(ViolationKind::from_label("somethingElse"), None);
    }

    #[test]
    fn test_state_entry_accessors() {
        let plain = StateEntry::Plain {
            state: "Active".to_string(),
        };
        assert_eq!(plain.state(), "Active");
        assert_eq!(plain.violation(), None);

        let violated = StateEntry::Violated {
            state: "Completed".to_string(),
            kind: ViolationKind::InactiveToCompleted,
        };
        assert_eq!(violated.state(), "Completed");
        assert_eq!(
            violated.violation(),
            Some(ViolationKind::InactiveToCompleted)
        );
    }
}
