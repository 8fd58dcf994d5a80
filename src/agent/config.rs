//! Configuration for creating an [`Agent`](super::Agent).

use serde::{Deserialize, Serialize};

use super::{
    action::Action,
    credit::Aggregate,
    policy::EpsilonSchedule,
    state::QuantizerConfig,
};
use crate::{Error, Result};

/// Configuration for creating a pinball agent.
///
/// # Examples
///
/// ```
/// use pinball_bot::agent::AgentConfig;
///
/// let config = AgentConfig::default()
///     .with_alpha(0.2)
///     .with_backport_window(35)
///     .with_epsilon(0.3)
///     .with_dynamic_epsilon(0.01, 1_000_000)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Fraction of the gap to the target closed by one update
    pub alpha: f64,
    /// Number of recent decisions credited with each observation
    pub backport_window: usize,
    /// Exploration schedule
    pub epsilon: EpsilonSchedule,
    /// State bucketing
    pub quantizer: QuantizerConfig,
    /// Target used when no reward fired
    pub aggregate: Aggregate,
    /// Actions the agent may choose from
    pub actions: Vec<Action>,
    /// Random seed; `None` seeds from the operating system
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.25,
            backport_window: 40,
            epsilon: EpsilonSchedule::default(),
            quantizer: QuantizerConfig::default(),
            aggregate: Aggregate::default(),
            actions: Action::ALL.to_vec(),
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_backport_window(mut self, window: usize) -> Self {
        self.backport_window = window;
        self
    }

    /// Use a constant exploration rate.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = EpsilonSchedule::Constant(epsilon);
        self
    }

    /// Decay from the current starting epsilon down to `min` over `steps_until_min` ticks.
    pub fn with_dynamic_epsilon(mut self, min: f64, steps_until_min: u64) -> Self {
        let initial = match self.epsilon {
            EpsilonSchedule::Constant(epsilon) => epsilon,
            EpsilonSchedule::Decaying { initial, .. } => initial,
        };
        self.epsilon = EpsilonSchedule::decaying(initial, min, steps_until_min);
        self
    }

    pub fn with_schedule(mut self, schedule: EpsilonSchedule) -> Self {
        self.epsilon = schedule;
        self
    }

    pub fn with_include_velocity(mut self, include: bool) -> Self {
        self.quantizer.include_velocity = include;
        self
    }

    pub fn with_include_flippers(mut self, include: bool) -> Self {
        self.quantizer.include_flippers = include;
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("alpha {} must lie in (0, 1]", self.alpha),
            });
        }
        if self.backport_window == 0 {
            return Err(Error::InvalidConfiguration {
                message: "backport window must hold at least one decision".to_string(),
            });
        }
        if self.actions.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "at least one action must be available".to_string(),
            });
        }
        self.epsilon.validate()?;
        self.quantizer.validate()
    }
}
