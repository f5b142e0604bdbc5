//! Per-case snapshot memoization.
//!
//! Keyed by the identity of the contributing observation set, not by
//! snapshot content: repeated identical observation windows reuse one
//! snapshot object and are referenced by index. The cache owns the
//! snapshot table while a case is processed and yields it afterward.

use caseflow_core::{ContextSnapshot, EngineError};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SnapshotCache {
    by_key: HashMap<Vec<usize>, usize>,
    table: Vec<ContextSnapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the snapshot for `identity_key`, building it only on the
    /// first occurrence. Indices are assigned in strictly increasing
    /// first-occurrence order. Returns the index and whether it is new.
    pub fn get_or_create<F>(
        &mut self,
        identity_key: Vec<usize>,
        build_fn: F,
    ) -> Result<(usize, bool), EngineError>
    where
        F: FnOnce() -> Result<ContextSnapshot, EngineError>,
    {
        if let Some(&idx) = self.by_key.get(&identity_key) {
            return Ok((idx, false));
        }
        let snapshot = build_fn()?;
        let idx = self.table.len();
        self.table.push(snapshot);
        self.by_key.insert(identity_key, idx);
        Ok((idx, true))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Hand off the snapshot table, consuming the cache
    pub fn into_table(self) -> Vec<ContextSnapshot> {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::ContextFact;

    fn snapshot(concept: &str) -> ContextSnapshot {
        ContextSnapshot {
            facts: vec![ContextFact::Attribute {
                concept: concept.to_string(),
                value: None,
            }],
        }
    }

    #[test]
    fn test_same_key_reuses_index_without_rebuilding() {
        let mut cache = SnapshotCache::new();
        let (first, is_new) = cache
            .get_or_create(vec![1, 2], || Ok(snapshot("a")))
            .unwrap();
        assert!(is_new);

        // The build closure must not run again for a seen key
        let (second, is_new) = cache
            .get_or_create(vec![1, 2], || panic!("rebuilt a memoized snapshot"))
            .unwrap();
        assert!(!is_new);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_indices_increase_in_first_occurrence_order() {
        let mut cache = SnapshotCache::new();
        let (a, _) = cache.get_or_create(vec![1], || Ok(snapshot("a"))).unwrap();
        let (b, _) = cache.get_or_create(vec![2], || Ok(snapshot("b"))).unwrap();
        let (c, _) = cache.get_or_create(vec![3], || Ok(snapshot("c"))).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));

        let table = cache.into_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], snapshot("a"));
        assert_eq!(table[2], snapshot("c"));
    }

    #[test]
    fn test_build_error_leaves_cache_unchanged() {
        let mut cache = SnapshotCache::new();
        let err = cache.get_or_create(vec![1], || {
            Err(EngineError::MissingStaticAttributes("7".to_string()))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }
}
