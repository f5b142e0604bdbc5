//! Interval index over the dynamic-attribute stream.
//!
//! Observations are grouped by (case, attribute) and each one is given a
//! half-open validity interval `[ts, next_ts)`, the last observation of a
//! group staying open-ended. Lookups resolve the observation active at an
//! instant with inclusive-lower / inclusive-upper-or-unbounded semantics.

use caseflow_core::DynamicObservation;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct IndexedObservation {
    from_ms: i64,
    /// Timestamp of the next observation in the group; None for the last
    until_ms: Option<i64>,
    obs: DynamicObservation,
}

/// Index of dynamic observations by (case, attribute), queryable at an
/// instant.
#[derive(Debug, Default)]
pub struct IntervalIndex {
    groups: BTreeMap<(String, String), Vec<IndexedObservation>>,
}

impl IntervalIndex {
    /// Group observations by (case, attribute), sort each group by
    /// timestamp (stable, so log order breaks ties) and derive the
    /// interval bounds. Within a group the intervals are contiguous and
    /// non-overlapping by construction.
    pub fn build(observations: &[DynamicObservation]) -> Self {
        let mut grouped: BTreeMap<(String, String), Vec<DynamicObservation>> = BTreeMap::new();
        for obs in observations {
            grouped
                .entry((obs.case_id.clone(), obs.attribute.clone()))
                .or_default()
                .push(obs.clone());
        }

        let mut groups = BTreeMap::new();
        for (key, mut group) in grouped {
            group.sort_by_key(|o| o.ts_ms);
            let indexed = group
                .iter()
                .enumerate()
                .map(|(i, obs)| IndexedObservation {
                    from_ms: obs.ts_ms,
                    until_ms: group.get(i + 1).map(|next| next.ts_ms),
                    obs: obs.clone(),
                })
                .collect();
            groups.insert(key, indexed);
        }

        Self { groups }
    }

    /// The observation whose interval contains `instant_ms`, or None when
    /// the instant falls before the group's first observation.
    ///
    /// Entries sharing a timestamp produce zero-length intervals; the
    /// search lands past the later entry, so the later write wins at the
    /// shared instant and at interval boundaries.
    pub fn lookup(
        &self,
        case_id: &str,
        attribute: &str,
        instant_ms: i64,
    ) -> Option<&DynamicObservation> {
        let key = (case_id.to_string(), attribute.to_string());
        let group = self.groups.get(&key)?;
        let idx = group.partition_point(|o| o.from_ms <= instant_ms);
        if idx == 0 {
            return None;
        }
        // Contiguity guarantees the candidate's upper bound covers the
        // instant: its until is the next entry's from (> instant) or open.
        Some(&group[idx - 1].obs)
    }

    /// Number of (case, attribute) groups in the index
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
