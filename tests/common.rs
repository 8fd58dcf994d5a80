//! Common test utilities for the pinball bot test suite.

#![allow(dead_code)]

use pinball_bot::{
    agent::{Action, StateKey, ValueTable},
    ports::FlipperControl,
};
use rand::{Rng, rngs::StdRng};

/// Flipper motors that only remember what they were told.
#[derive(Debug, Default)]
pub struct RecordingControl {
    pub left: bool,
    pub right: bool,
    pub commands: usize,
}

impl FlipperControl for RecordingControl {
    fn set_left_flipper(&mut self, enabled: bool) {
        self.left = enabled;
        self.commands += 1;
    }

    fn set_right_flipper(&mut self, enabled: bool) {
        self.right = enabled;
        self.commands += 1;
    }
}

/// A random state key with kinematic buckets in a small range, so repeated
/// draws collide now and then.
pub fn random_key(rng: &mut StdRng) -> StateKey {
    StateKey::from_buckets(
        rng.random_range(-20..20),
        rng.random_range(0..50),
        rng.random_range(-5..5),
        rng.random_range(-5..5),
    )
}

/// A table of `states` distinct states with every action set to a value
/// strictly inside `(0, 1)`.
pub fn populated_table(states: usize, rng: &mut StdRng) -> ValueTable {
    let mut table = ValueTable::new();
    while table.len() < states {
        let (index, _) = table.find_or_insert(random_key(rng));
        for action in Action::ALL {
            table.set_value(index, action, rng.random_range(0.01..0.99));
        }
    }
    table
}
