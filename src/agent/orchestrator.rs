//! The agent: resolves states, assigns credit, and picks the next action.

use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{
    action::{Action, MIN_REWARD},
    config::AgentConfig,
    credit::CreditAssignment,
    history::LastActions,
    policy::{EpsilonSchedule, epsilon_greedy},
    state::{BallSnapshot, Quantizer, StateKey},
    value_table::ValueTable,
};
use crate::{Result, ports::FlipperControl};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Tabular pinball agent.
///
/// Owns the value table and the backport window. The driver calls
/// [`Agent::think`] once per simulation tick.
#[derive(Debug, Clone)]
pub struct Agent {
    table: ValueTable,
    window: LastActions,
    quantizer: Quantizer,
    schedule: EpsilonSchedule,
    credit: CreditAssignment,
    actions: Vec<Action>,
    rng: StdRng,
}

impl Agent {
    /// Create an agent with an empty value table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if `config` does not validate.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: ValueTable::new(),
            window: LastActions::new(config.backport_window),
            quantizer: Quantizer::new(config.quantizer),
            schedule: config.epsilon,
            credit: CreditAssignment::new(config.alpha, config.aggregate)?,
            actions: config.actions,
            rng: build_rng(config.seed),
        })
    }

    /// Replace the value table, e.g. with one loaded from disk.
    pub fn with_table(mut self, table: ValueTable) -> Self {
        self.table = table;
        self.window.clear();
        self
    }

    /// Quantize an environment snapshot with this agent's settings.
    pub fn state_key(&self, snapshot: &BallSnapshot) -> StateKey {
        self.quantizer.quantize_snapshot(snapshot)
    }

    /// Run one decision cycle and execute the chosen action on `control`.
    ///
    /// `rewards` holds every reward collected since the previous call.
    pub fn think<C: FlipperControl + ?Sized>(
        &mut self,
        state: StateKey,
        rewards: &[f64],
        tick: u64,
        control: &mut C,
    ) -> Action {
        let current = self.resolve(state);

        if rewards.contains(&MIN_REWARD) {
            debug!(tick, state = %state, "terminal reward observed");
        }
        self.credit
            .assign(&mut self.table, &self.window, current, rewards);

        let epsilon = self.schedule.epsilon(tick);
        let action = epsilon_greedy(
            self.table.values(current),
            &self.actions,
            epsilon,
            &mut self.rng,
        );
        action.run(control);

        self.window.push(current, action);
        action
    }

    /// Find or insert `state`, keeping the window's indices valid.
    fn resolve(&mut self, state: StateKey) -> usize {
        let (index, inserted) = self.table.find_or_insert(state);
        if inserted {
            self.window.rebase(index);
        }
        self.table.ensure_actions(index, &self.actions);
        index
    }

    /// Exploration rate in effect at `tick`.
    pub fn epsilon(&self, tick: u64) -> f64 {
        self.schedule.epsilon(tick)
    }

    /// Drop every state that never left the default value.
    ///
    /// Clears the backport window, since its indices no longer apply.
    pub fn clear_states(&mut self) -> usize {
        let removed = self.table.prune_uninformative();
        self.window.clear();
        removed
    }

    /// Forget the pending decisions, e.g. after the ball was respawned.
    pub fn forget_recent(&mut self) {
        self.window.clear();
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn into_table(self) -> ValueTable {
        self.table
    }

    pub fn recent_decisions(&self) -> &LastActions {
        &self.window
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}
