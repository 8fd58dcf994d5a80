//! Sorted lookup table from state keys to per-action values.
//!
//! States are kept in a dense vector ordered by [`StateKey`], giving
//! `O(log n)` lookup by binary search and `O(n)` insertion. Indices handed
//! out by [`ValueTable::find_or_insert`] stay valid until the next insertion
//! or prune; callers that keep indices across an insertion must shift every
//! index at or after the insertion point by one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    action::{Action, DEFAULT_REWARD},
    state::StateKey,
};

/// Values of the actions tried (or registered) in one state.
///
/// Missing actions read as [`DEFAULT_REWARD`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues(BTreeMap<Action, f64>);

impl ActionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, or [`DEFAULT_REWARD`] if the action was never set.
    pub fn get(&self, action: Action) -> f64 {
        self.0.get(&action).copied().unwrap_or(DEFAULT_REWARD)
    }

    pub fn set(&mut self, action: Action, value: f64) {
        self.0.insert(action, value);
    }

    /// Register a default entry for every action not yet present.
    pub fn ensure(&mut self, actions: &[Action]) {
        for &action in actions {
            self.0.entry(action).or_insert(DEFAULT_REWARD);
        }
    }

    /// Mean over the entries that moved away from [`DEFAULT_REWARD`].
    ///
    /// Falls back to [`DEFAULT_REWARD`] when nothing informative is stored.
    pub fn average(&self) -> f64 {
        let (sum, count) = self
            .0
            .values()
            .filter(|&&value| value != DEFAULT_REWARD)
            .fold((0.0, 0usize), |(sum, count), &value| (sum + value, count + 1));
        if count == 0 {
            DEFAULT_REWARD
        } else {
            sum / count as f64
        }
    }

    /// Best stored value, default entries included.
    pub fn general(&self) -> f64 {
        self.0
            .values()
            .copied()
            .fold(None, |best: Option<f64>, value| {
                Some(best.map_or(value, |b| b.max(value)))
            })
            .unwrap_or(DEFAULT_REWARD)
    }

    /// True when every stored entry still equals [`DEFAULT_REWARD`].
    pub fn is_uninformative(&self) -> bool {
        self.0.values().all(|&value| value == DEFAULT_REWARD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, f64)> + '_ {
        self.0.iter().map(|(&action, &value)| (action, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: StateKey,
    pub values: ActionValues,
}

/// The agent's value function: `StateKey -> {Action -> value}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StateEntry>", into = "Vec<StateEntry>")]
pub struct ValueTable {
    entries: Vec<StateEntry>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `key`, if the state is known.
    pub fn find(&self, key: &StateKey) -> Option<usize> {
        self.entries.binary_search_by(|entry| entry.key.cmp(key)).ok()
    }

    /// Look up `key`, inserting an empty entry at its sorted position if absent.
    ///
    /// Returns the index and whether an insertion happened. An insertion at
    /// index `i` shifts every previously handed out index `>= i` by one.
    pub fn find_or_insert(&mut self, key: StateKey) -> (usize, bool) {
        match self.entries.binary_search_by(|entry| entry.key.cmp(&key)) {
            Ok(index) => (index, false),
            Err(index) => {
                self.entries.insert(
                    index,
                    StateEntry {
                        key,
                        values: ActionValues::new(),
                    },
                );
                (index, true)
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn value(&self, index: usize, action: Action) -> f64 {
        self.entries[index].values.get(action)
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_value(&mut self, index: usize, action: Action, value: f64) {
        self.entries[index].values.set(action, value);
    }

    /// Make sure the state at `index` has an entry for every action.
    pub fn ensure_actions(&mut self, index: usize, actions: &[Action]) {
        self.entries[index].values.ensure(actions);
    }

    pub fn average_value(&self, index: usize) -> f64 {
        self.entries[index].values.average()
    }

    pub fn general_value(&self, index: usize) -> f64 {
        self.entries[index].values.general()
    }

    pub fn key(&self, index: usize) -> &StateKey {
        &self.entries[index].key
    }

    pub fn values(&self, index: usize) -> &ActionValues {
        &self.entries[index].values
    }

    /// Values for `key`, if the state is known.
    pub fn get(&self, key: &StateKey) -> Option<&ActionValues> {
        self.find(key).map(|index| &self.entries[index].values)
    }

    /// Remove every state matching `predicate`. Returns how many were removed.
    ///
    /// All previously handed out indices are invalid afterwards.
    pub fn prune<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&StateEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(entry));
        before - self.entries.len()
    }

    /// Remove the states that never moved away from the default value.
    pub fn prune_uninformative(&mut self) -> usize {
        self.prune(|entry| entry.values.is_uninformative())
    }

    /// Number of states whose values carry information.
    pub fn informative_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.values.is_uninformative())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<StateEntry>> for ValueTable {
    /// Sorts the entries; duplicate keys are merged, later values winning.
    fn from(mut entries: Vec<StateEntry>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        let mut merged: Vec<StateEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match merged.last_mut() {
                Some(last) if last.key == entry.key => {
                    for (action, value) in entry.values.iter() {
                        last.values.set(action, value);
                    }
                }
                _ => merged.push(entry),
            }
        }
        Self { entries: merged }
    }
}

impl From<ValueTable> for Vec<StateEntry> {
    fn from(table: ValueTable) -> Self {
        table.entries
    }
}
