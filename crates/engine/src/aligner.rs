//! Case aligner: one snapshot index per event.
//!
//! Walks a case's events in timestamp order, resolves each event's
//! contributing observation set through the interval index, and reuses
//! snapshots whenever the set's identity repeats.

use caseflow_core::{Case, CaseAlignment, EngineError};

use crate::dedup::SnapshotCache;
use crate::snapshot_builder::SnapshotBuilder;

pub struct CaseAligner<'a> {
    builder: SnapshotBuilder<'a>,
}

impl<'a> CaseAligner<'a> {
    pub fn new(builder: SnapshotBuilder<'a>) -> Self {
        Self { builder }
    }

    /// Align one case. The alignment has exactly one entry per event,
    /// each a valid index into the returned snapshot table.
    ///
    /// A case without a static-attribute row is a data-integrity error,
    /// never an empty snapshot.
    pub fn align(&self, case: &Case) -> Result<CaseAlignment, EngineError> {
        let statics = case
            .statics
            .as_ref()
            .ok_or_else(|| EngineError::MissingStaticAttributes(case.case_id.clone()))?;

        let mut events = case.events.clone();
        events.sort_by_key(|e| e.ts_ms);

        let mut cache = SnapshotCache::new();
        let mut alignment = Vec::with_capacity(events.len());
        for event in &events {
            let key = self.builder.identity_key(&case.case_id, event.ts_ms);
            let (idx, _) = cache.get_or_create(key, || self.builder.build(statics, event.ts_ms))?;
            alignment.push(idx);
        }

        Ok(CaseAlignment {
            case_id: case.case_id.clone(),
            alignment,
            snapshots: cache.into_table(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_lookup::TableCodeLookup;
    use crate::config::OnUnresolvedCode;
    use crate::interval_index::IntervalIndex;
    use caseflow_core::{DynamicObservation, Event, StaticAttributes};

    fn obs(row: usize, attribute: &str, value: &str, ts_ms: i64) -> DynamicObservation {
        DynamicObservation {
            row,
            case_id: "7".to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            ts_ms,
        }
    }

    fn case(events: Vec<Event>) -> Case {
        Case {
            case_id: "7".to_string(),
            events,
            statics: Some(StaticAttributes {
                case_id: "7".to_string(),
                ..Default::default()
            }),
        }
    }

    fn tracked() -> Vec<String> {
        vec!["Heart rate".to_string()]
    }

    #[test]
    fn test_alignment_has_one_valid_index_per_event() {
        let index = IntervalIndex::build(&[
            obs(0, "Heart rate", "80", 10),
            obs(1, "Heart rate", "95", 20),
        ]);
        let codes = TableCodeLookup::new();
        let tracked = tracked();
        let aligner = CaseAligner::new(SnapshotBuilder::new(
            &index,
            &codes,
            &tracked,
            OnUnresolvedCode::Fail,
            "Admitted",
        ));

        let case = case(vec![
            Event::new("7", "Triage", 11),
            Event::new("7", "Lab", 15),
            Event::new("7", "Discharge", 25),
        ]);
        let result = aligner.align(&case).unwrap();

        assert_eq!(result.alignment.len(), case.events.len());
        for &idx in &result.alignment {
            assert!(idx < result.snapshots.len());
        }
        // Window changed between t=15 and t=25
        assert_eq!(result.alignment, vec![0, 0, 1]);
        assert_eq!(result.snapshots.len(), 2);
    }

    #[test]
    fn test_events_in_same_window_share_one_snapshot() {
        let index = IntervalIndex::build(&[
            obs(0, "Heart rate", "80", 10),
            obs(1, "Heart rate", "95", 20),
        ]);
        let codes = TableCodeLookup::new();
        let tracked = tracked();
        let aligner = CaseAligner::new(SnapshotBuilder::new(
            &index,
            &codes,
            &tracked,
            OnUnresolvedCode::Fail,
            "Admitted",
        ));

        // Both events fall strictly between the same observation boundaries
        let case = case(vec![
            Event::new("7", "Triage", 12),
            Event::new("7", "Lab", 18),
        ]);
        let result = aligner.align(&case).unwrap();
        assert_eq!(result.alignment, vec![0, 0]);
        assert_eq!(result.snapshots.len(), 1);
    }

    #[test]
    fn test_events_are_processed_in_timestamp_order() {
        let index = IntervalIndex::build(&[
            obs(0, "Heart rate", "80", 10),
            obs(1, "Heart rate", "95", 20),
        ]);
        let codes = TableCodeLookup::new();
        let tracked = tracked();
        let aligner = CaseAligner::new(SnapshotBuilder::new(
            &index,
            &codes,
            &tracked,
            OnUnresolvedCode::Fail,
            "Admitted",
        ));

        // Out-of-order input: the later window must still get the later index
        let case = case(vec![
            Event::new("7", "Discharge", 25),
            Event::new("7", "Triage", 12),
        ]);
        let result = aligner.align(&case).unwrap();
        assert_eq!(result.alignment, vec![0, 1]);
    }

    #[test]
    fn test_missing_statics_is_a_data_integrity_error() {
        let index = IntervalIndex::build(&[]);
        let codes = TableCodeLookup::new();
        let tracked = tracked();
        let aligner = CaseAligner::new(SnapshotBuilder::new(
            &index,
            &codes,
            &tracked,
            OnUnresolvedCode::Fail,
            "Admitted",
        ));

        let case = Case {
            case_id: "7".to_string(),
            events: vec![Event::new("7", "Triage", 12)],
            statics: None,
        };
        match aligner.align(&case).unwrap_err() {
            EngineError::MissingStaticAttributes(case_id) => assert_eq!(case_id, "7"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
