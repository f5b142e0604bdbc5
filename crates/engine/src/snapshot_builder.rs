//! Snapshot builder: resolves the facts visible to a case at one instant.
//!
//! Dynamic facts come from the interval index; static and
//! classification-derived facts come from the case's static record and
//! contribute regardless of the instant. Building is a pure function of
//! its inputs.

use caseflow_core::{ContextFact, ContextSnapshot, EngineError, StaticAttributes};

use crate::code_lookup::CodeLookup;
use crate::config::OnUnresolvedCode;
use crate::interval_index::IntervalIndex;

pub struct SnapshotBuilder<'a> {
    index: &'a IntervalIndex,
    codes: &'a dyn CodeLookup,
    tracked_attributes: &'a [String],
    on_unresolved_code: OnUnresolvedCode,
    admitted_prefix: &'a str,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(
        index: &'a IntervalIndex,
        codes: &'a dyn CodeLookup,
        tracked_attributes: &'a [String],
        on_unresolved_code: OnUnresolvedCode,
        admitted_prefix: &'a str,
    ) -> Self {
        Self {
            index,
            codes,
            tracked_attributes,
            on_unresolved_code,
            admitted_prefix,
        }
    }

    /// Identity of the observation set a snapshot at `instant_ms` would
    /// read: the sorted source-row positions of every active observation.
    /// Snapshots are deduplicated on this key, not on fact content.
    pub fn identity_key(&self, case_id: &str, instant_ms: i64) -> Vec<usize> {
        let mut key: Vec<usize> = self
            .tracked_attributes
            .iter()
            .filter_map(|attr| self.index.lookup(case_id, attr, instant_ms))
            .map(|obs| obs.row)
            .collect();
        key.sort_unstable();
        key
    }

    /// Build the snapshot for `instant_ms`. Attributes with no active
    /// observation are simply absent.
    pub fn build(
        &self,
        statics: &StaticAttributes,
        instant_ms: i64,
    ) -> Result<ContextSnapshot, EngineError> {
        let mut facts = Vec::new();

        for attr in self.tracked_attributes {
            if let Some(obs) = self.index.lookup(&statics.case_id, attr, instant_ms) {
                facts.push(ContextFact::Attribute {
                    concept: attr.clone(),
                    value: obs.numeric_value(),
                });
            }
        }

        if let Some(age) = statics.age {
            facts.push(ContextFact::Attribute {
                concept: "age".to_string(),
                value: Some(age),
            });
        }

        if let Some(disposition) = &statics.disposition {
            if disposition.starts_with(self.admitted_prefix) {
                facts.push(ContextFact::Admitted);
            }
        }

        for code in &statics.classification_codes {
            let description = match self.codes.describe(code) {
                Some(description) => description,
                None => match self.on_unresolved_code {
                    OnUnresolvedCode::Fail => {
                        return Err(EngineError::UnresolvedCode {
                            case_id: statics.case_id.clone(),
                            code: code.clone(),
                        })
                    }
                    OnUnresolvedCode::Placeholder => {
                        eprintln!(
                            "[snapshot] unknown classification code {} (case {})",
                            code, statics.case_id
                        );
                        "unknown".to_string()
                    }
                },
            };
            facts.push(ContextFact::Condition {
                code: code.clone(),
                description,
            });
        }

        Ok(ContextSnapshot { facts })
    }
}
