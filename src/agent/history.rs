//! Bounded window of recent decisions eligible for credit assignment.

use std::collections::VecDeque;

use super::action::Action;

/// One decision: the table index of the state and the action taken there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state_index: usize,
    pub action: Action,
}

/// FIFO of the last `capacity` decisions ("backport window").
///
/// Stores value-table indices, so it must be rebased whenever the table
/// inserts a state and cleared whenever the table is pruned.
#[derive(Debug, Clone)]
pub struct LastActions {
    decisions: VecDeque<Decision>,
    capacity: usize,
}

impl LastActions {
    pub fn new(capacity: usize) -> Self {
        Self {
            decisions: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a decision, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, state_index: usize, action: Action) {
        self.decisions.push_back(Decision {
            state_index,
            action,
        });
        while self.decisions.len() > self.capacity {
            self.decisions.pop_front();
        }
    }

    /// Shift every stored index at or after `inserted_at` by one.
    pub fn rebase(&mut self, inserted_at: usize) {
        for decision in &mut self.decisions {
            if decision.state_index >= inserted_at {
                decision.state_index += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Decision> + '_ {
        self.decisions.iter()
    }

    pub fn newest(&self) -> Option<&Decision> {
        self.decisions.back()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
