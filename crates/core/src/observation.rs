//! Per-case attribute records: the time-stamped dynamic stream and the
//! static row each case carries.

use serde::{Deserialize, Serialize};

use super::Event;

/// One time-stamped observation of a dynamic attribute.
///
/// An observation is valid from its own timestamp until the next
/// observation of the same (case, attribute), or indefinitely if none
/// follows. `row` is the observation's position in the source stream and
/// serves as its identity when snapshots are deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicObservation {
    /// Source-row position in the observation stream
    pub row: usize,

    pub case_id: String,

    /// Attribute name, e.g. "Heart rate"
    pub attribute: String,

    /// Raw observed value; numeric when it parses as one
    pub value: String,

    /// Observation timestamp in epoch milliseconds
    pub ts_ms: i64,
}

impl DynamicObservation {
    /// Numeric reading of the value, if it parses as one
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Static attributes: one record per case, independent of time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticAttributes {
    pub case_id: String,

    /// Age/duration value carried by the case record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,

    /// Discharge/disposition free text; its prefix decides the admitted fact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,

    /// External classification codes, already split from the delimited column
    #[serde(default)]
    pub classification_codes: Vec<String>,
}

/// One tracked process instance: its ordered event history plus the
/// static record for the case. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,

    /// Events ordered by timestamp, ties broken by log order
    pub events: Vec<Event>,

    /// Missing statics are a data-integrity error at alignment time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statics: Option<StaticAttributes>,
}
