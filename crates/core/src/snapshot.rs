//! Context snapshots: the set of coded facts visible to a case at one
//! instant, and the per-case alignment of events onto snapshots.

use serde::{Deserialize, Serialize};

/// One coded fact inside a context snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContextFact {
    /// Attribute-concept binding, optionally carrying a numeric reading
    Attribute {
        concept: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },

    /// Condition binding decoded from a static classification code
    Condition { code: String, description: String },

    /// Emitted when the case's disposition marks it as admitted
    Admitted,
}

/// The world state visible to a case at a given instant.
///
/// Two snapshots are deduplicated by the identity of their contributing
/// observations, not by fact content; equality here is only used by tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub facts: Vec<ContextFact>,
}

impl ContextSnapshot {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Output of aligning one case: one snapshot-table index per event, plus
/// the table of distinct snapshots in first-occurrence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAlignment {
    pub case_id: String,

    /// One entry per event, in event order; indexes into `snapshots`
    pub alignment: Vec<usize>,

    /// Distinct snapshots in order of first occurrence
    pub snapshots: Vec<ContextSnapshot>,
}
