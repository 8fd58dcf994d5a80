//! Windowed backward credit assignment.
//!
//! Every decision still held in the backport window is nudged towards what
//! was observed since the last tick: each collected reward in turn, or, when
//! no reward fired, the aggregate value of the state the ball is in now. The
//! update is exponential smoothing, `v <- v + alpha * (target - v)`, so values
//! on the `[0, 1]` reward scale never leave it.

use serde::{Deserialize, Serialize};

use super::{history::LastActions, value_table::ValueTable};
use crate::{Error, Result};

/// How a state's action values are summarised into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    /// Mean of the non-default values
    #[default]
    Average,
    /// Maximum value, defaults included
    General,
}

impl Aggregate {
    pub fn of(&self, table: &ValueTable, index: usize) -> f64 {
        match self {
            Aggregate::Average => table.average_value(index),
            Aggregate::General => table.general_value(index),
        }
    }
}

/// The update rule applied across the backport window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditAssignment {
    alpha: f64,
    aggregate: Aggregate,
}

impl CreditAssignment {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] unless `0 < alpha <= 1`.
    pub fn new(alpha: f64, aggregate: Aggregate) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("adjustment fraction {alpha} must lie in (0, 1]"),
            });
        }
        Ok(Self { alpha, aggregate })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn aggregate(&self) -> Aggregate {
        self.aggregate
    }

    /// One smoothing step of `value` towards `target`.
    pub fn smooth(&self, value: f64, target: f64) -> f64 {
        value + self.alpha * (target - value)
    }

    /// Apply every reward in order.
    pub fn apply_rewards(&self, value: f64, rewards: &[f64]) -> f64 {
        rewards
            .iter()
            .fold(value, |value, &reward| self.smooth(value, reward))
    }

    /// Update every decision in `window` (oldest first).
    ///
    /// `current` is the table index of the state just observed; its aggregate
    /// value is the target when `rewards` is empty. The window must already be
    /// rebased for any insertion that produced `current`.
    pub fn assign(
        &self,
        table: &mut ValueTable,
        window: &LastActions,
        current: usize,
        rewards: &[f64],
    ) {
        if window.is_empty() {
            return;
        }

        let fallback = self.aggregate.of(table, current);
        for decision in window.iter() {
            let value = table.value(decision.state_index, decision.action);
            let updated = if rewards.is_empty() {
                self.smooth(value, fallback)
            } else {
                self.apply_rewards(value, rewards)
            };
            table.set_value(decision.state_index, decision.action, updated);
        }
    }
}
