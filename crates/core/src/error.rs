//! Error taxonomy shared across the alignment engine and decoder.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Data integrity: an event's case has no static-attribute row
    #[error("no static attributes for case {0}")]
    MissingStaticAttributes(String),

    /// Data integrity: an input row failed validation
    #[error("invalid input row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    /// A classification code was not found in the description table
    #[error("unresolved classification code {code} for case {case_id}")]
    UnresolvedCode { case_id: String, code: String },

    /// Decoder contract: an item arrived with no state history
    #[error("empty state history for item {0}")]
    EmptyStateHistory(String),

    /// Decoder contract: a state entry did not have the expected shape
    #[error("malformed state entry for item {item}: {reason}")]
    MalformedStateEntry { item: String, reason: String },

    /// Decoder contract: a violation label outside the rule set
    #[error("unknown violation kind {kind} for item {item}")]
    UnknownViolationKind { item: String, kind: String },

    /// The external rule engine failed or produced unusable output
    #[error("reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}
