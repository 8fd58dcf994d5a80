//! Epsilon-greedy action selection and exploration schedules.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::{action::Action, value_table::ActionValues};
use crate::{Error, Result};

/// Exploration probability as a function of the simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpsilonSchedule {
    /// Same epsilon on every tick
    Constant(f64),
    /// Exponential decay from `initial` towards `min`
    ///
    /// `epsilon(t) = (initial - min) * exp(rate * t) + min` with
    /// `rate = ln(delta_min / (initial - min)) / steps_until_min`, so that
    /// epsilon is `min + delta_min` at `steps_until_min` and `min` afterwards.
    Decaying {
        initial: f64,
        min: f64,
        delta_min: f64,
        steps_until_min: u64,
    },
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        EpsilonSchedule::Constant(0.1)
    }
}

impl EpsilonSchedule {
    /// Decay schedule with the customary `delta_min` of 0.001.
    pub fn decaying(initial: f64, min: f64, steps_until_min: u64) -> Self {
        EpsilonSchedule::Decaying {
            initial,
            min,
            delta_min: 0.001,
            steps_until_min,
        }
    }

    pub fn epsilon(&self, tick: u64) -> f64 {
        match *self {
            EpsilonSchedule::Constant(epsilon) => epsilon,
            EpsilonSchedule::Decaying {
                initial,
                min,
                delta_min,
                steps_until_min,
            } => {
                let span = initial - min;
                if span <= 0.0 || steps_until_min == 0 || tick >= steps_until_min {
                    return min;
                }
                let rate = (delta_min / span).ln() / steps_until_min as f64;
                span * (rate * tick as f64).exp() + min
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if a probability leaves `[0, 1]`,
    /// a decay would have to rise (`initial < min`), or `delta_min` is not
    /// within `(0, initial - min)`.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |value: f64| (0.0..=1.0).contains(&value);
        match *self {
            EpsilonSchedule::Constant(epsilon) if !in_unit(epsilon) => {
                Err(Error::InvalidConfiguration {
                    message: format!("epsilon {epsilon} must lie in [0, 1]"),
                })
            }
            EpsilonSchedule::Decaying { initial, min, .. } if !in_unit(initial) || !in_unit(min) => {
                Err(Error::InvalidConfiguration {
                    message: format!("epsilon bounds {initial}..{min} must lie in [0, 1]"),
                })
            }
            EpsilonSchedule::Decaying { initial, min, .. } if initial < min => {
                Err(Error::InvalidConfiguration {
                    message: format!("epsilon cannot decay upwards from {initial} to {min}"),
                })
            }
            EpsilonSchedule::Decaying {
                initial,
                min,
                delta_min,
                ..
            } if initial > min && !(delta_min > 0.0 && delta_min < initial - min) => {
                Err(Error::InvalidConfiguration {
                    message: format!(
                        "delta_min {delta_min} must lie strictly between 0 and {}",
                        initial - min
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Every action sharing the highest value in `values`.
pub fn greedy_actions(values: &ActionValues, actions: &[Action]) -> Vec<Action> {
    let best = actions
        .iter()
        .map(|&action| values.get(action))
        .fold(f64::NEG_INFINITY, f64::max);
    actions
        .iter()
        .copied()
        .filter(|&action| values.get(action) == best)
        .collect()
}

/// Pick an action: with probability `1 - epsilon` one of the best valued
/// actions (ties broken uniformly), otherwise any action uniformly.
///
/// # Panics
///
/// Panics if `actions` is empty.
pub fn epsilon_greedy<R: Rng + ?Sized>(
    values: &ActionValues,
    actions: &[Action],
    epsilon: f64,
    rng: &mut R,
) -> Action {
    assert!(!actions.is_empty(), "epsilon-greedy needs at least one action");

    let draw: f64 = rng.random();
    let candidates = if draw >= epsilon {
        greedy_actions(values, actions)
    } else {
        actions.to_vec()
    };
    *candidates
        .choose(rng)
        .expect("candidate set is never empty for a non-empty action list")
}
