//! Verdict decoder.
//!
//! The external rule engine reports, per monitored item, an ordered list
//! of state entries encoded as nested lists: `[state, detail]` where
//! `detail` is a single value (state only) or a pair whose second element
//! names the violation that fired under that state. The decoder lifts
//! this into typed `StateEntry` values and folds them into one verdict
//! per item: the last entry's state is final, every violated entry
//! contributes one violation.
//!
//! Malformed input is a contract violation of the upstream engine and
//! fails fast; a default final state is never inferred.

use caseflow_core::{EngineError, ItemVerdict, StateEntry, Violation, ViolationKind};
use serde_json::Value;
use std::collections::BTreeMap;

/// Decode the full encoded result: item → verdict.
pub fn decode_result(encoded: &Value) -> Result<BTreeMap<String, ItemVerdict>, EngineError> {
    let items = encoded
        .as_object()
        .ok_or_else(|| EngineError::MalformedStateEntry {
            item: "<result>".to_string(),
            reason: "encoded result is not an object".to_string(),
        })?;

    let mut verdicts = BTreeMap::new();
    for (item, entries) in items {
        let history = decode_state_entries(item, entries)?;
        let last = history
            .last()
            .ok_or_else(|| EngineError::EmptyStateHistory(item.clone()))?;

        let violations = history
            .iter()
            .filter_map(|entry| {
                entry.violation().map(|kind| Violation {
                    kind,
                    state: entry.state().to_string(),
                })
            })
            .collect();

        verdicts.insert(
            item.clone(),
            ItemVerdict {
                final_state: last.state().to_string(),
                violations,
            },
        );
    }
    Ok(verdicts)
}

/// Decode one item's state history.
pub fn decode_state_entries(item: &str, entries: &Value) -> Result<Vec<StateEntry>, EngineError> {
    let list = entries
        .as_array()
        .ok_or_else(|| EngineError::MalformedStateEntry {
            item: item.to_string(),
            reason: "state history is not a list".to_string(),
        })?;

    list.iter()
        .map(|entry| decode_state_entry(item, entry))
        .collect()
}

fn decode_state_entry(item: &str, entry: &Value) -> Result<StateEntry, EngineError> {
    let pair = entry
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| EngineError::MalformedStateEntry {
            item: item.to_string(),
            reason: "state entry is not a [state, detail] pair".to_string(),
        })?;

    let state = pair[0]
        .as_str()
        .ok_or_else(|| EngineError::MalformedStateEntry {
            item: item.to_string(),
            reason: "state label is not a string".to_string(),
        })?
        .to_string();

    // A detail longer than one element carries the violation kind in its
    // second position; anything shorter is just the state.
    match pair[1].as_array() {
        Some(detail) if detail.len() > 1 => {
            let label = detail[1]
                .as_str()
                .ok_or_else(|| EngineError::MalformedStateEntry {
                    item: item.to_string(),
                    reason: "violation kind is not a string".to_string(),
                })?;
            let kind = ViolationKind::from_label(label).ok_or_else(|| {
                EngineError::UnknownViolationKind {
                    item: item.to_string(),
                    kind: label.to_string(),
                }
            })?;
            Ok(StateEntry::Violated { state, kind })
        }
        _ => Ok(StateEntry::Plain { state }),
    }
}
