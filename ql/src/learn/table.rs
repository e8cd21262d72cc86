use rustc_hash::FxHashMap;

use crate::prelude::{StateKey, View};

/// Visit counts never grow beyond that value
pub const VISIT_COUNT_CEILING: u32 = u32::MAX;

/// Action-value table: one row of `N` utilities per encoded state.
///
/// Rows are created on first (mutable) access and start with all utilities at zero.
pub struct QTable<V: View, const N: usize> {
    rows: FxHashMap<StateKey<V>, [f32; N]>,
}

impl<V: View, const N: usize> QTable<V, N> {
    pub fn new() -> Self {
        Self {
            rows: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: StateKey<V>) -> [f32; N] {
        self.rows.get(&key).copied().unwrap_or([0.0; N])
    }

    pub fn row_mut(&mut self, key: StateKey<V>) -> &mut [f32; N] {
        self.rows.entry(key).or_insert([0.0; N])
    }

    pub fn contains(&self, key: StateKey<V>) -> bool {
        self.rows.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered by key
    pub fn sorted_rows(&self) -> Vec<(StateKey<V>, [f32; N])> {
        let mut rows: Vec<_> = self.rows.iter().map(|(&k, &r)| (k, r)).collect();
        rows.sort_unstable_by_key(|(k, _)| *k);
        rows
    }

    pub(crate) fn insert(&mut self, key: StateKey<V>, row: [f32; N]) -> Option<[f32; N]> {
        self.rows.insert(key, row)
    }
}

impl<V: View, const N: usize> Default for QTable<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts per encoded state, how often each action was chosen from there.
pub struct VisitTable<V: View, const N: usize> {
    rows: FxHashMap<StateKey<V>, [u32; N]>,
}

impl<V: View, const N: usize> VisitTable<V, N> {
    pub fn new() -> Self {
        Self {
            rows: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: StateKey<V>) -> [u32; N] {
        self.rows.get(&key).copied().unwrap_or([0; N])
    }

    /// Counts one more visit, saturating at [VISIT_COUNT_CEILING]
    pub fn increment(&mut self, key: StateKey<V>, slot: usize) {
        let count = &mut self.rows.entry(key).or_insert([0; N])[slot];
        if *count < VISIT_COUNT_CEILING {
            *count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sorted_rows(&self) -> Vec<(StateKey<V>, [u32; N])> {
        let mut rows: Vec<_> = self.rows.iter().map(|(&k, &r)| (k, r)).collect();
        rows.sort_unstable_by_key(|(k, _)| *k);
        rows
    }

    pub(crate) fn insert(&mut self, key: StateKey<V>, row: [u32; N]) -> Option<[u32; N]> {
        self.rows.insert(key, row)
    }
}

impl<V: View, const N: usize> Default for VisitTable<V, N> {
    fn default() -> Self {
        Self::new()
    }
}
