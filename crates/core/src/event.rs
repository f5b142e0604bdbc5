use serde::{Deserialize, Serialize};

/// One row of the event log. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub case_id: String,

    /// Activity label, e.g. "Triage" or "ER Sepsis Triage"
    pub activity: String,

    /// Event timestamp in epoch milliseconds
    pub ts_ms: i64,
}

impl Event {
    pub fn new(case_id: impl Into<String>, activity: impl Into<String>, ts_ms: i64) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            ts_ms,
        }
    }
}
