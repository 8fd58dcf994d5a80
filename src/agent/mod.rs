//! Tabular reinforcement learning for the flippers
//!
//! The agent keeps a discrete value function over quantized ball states and
//! learns it with a windowed backward update:
//!
//! - [`state`]: bucketing of ball kinematics into [`StateKey`]s
//! - [`action`]: the four flipper commands and the reward scale
//! - [`value_table`]: sorted `StateKey -> {Action -> value}` table
//! - [`history`]: the backport window of recent decisions
//! - [`policy`]: epsilon-greedy selection and epsilon schedules
//! - [`credit`]: smoothing of windowed decisions towards observed rewards
//! - [`orchestrator`]: the [`Agent`] tying it together once per tick
//!
//! ## Usage Example
//!
//! ```no_run
//! use pinball_bot::agent::{Agent, AgentConfig};
//! use pinball_bot::ports::Environment;
//! use pinball_bot::sim::PinballTable;
//!
//! let mut table = PinballTable::default();
//! let mut agent = Agent::new(AgentConfig::default().with_epsilon(0.2))?;
//!
//! for tick in 0..1_000 {
//!     let outcome = table.step(1.0 / 60.0);
//!     let state = agent.state_key(&table.snapshot());
//!     agent.think(state, &outcome.rewards, tick, &mut table);
//! }
//! # Ok::<(), pinball_bot::Error>(())
//! ```

pub mod action;
pub mod config;
pub mod credit;
pub mod history;
pub mod orchestrator;
pub mod policy;
pub mod state;
pub mod value_table;

pub use action::{Action, DEFAULT_REWARD, MAX_REWARD, MIN_REWARD};
pub use config::AgentConfig;
pub use credit::{Aggregate, CreditAssignment};
pub use history::{Decision, LastActions};
pub use orchestrator::Agent;
pub use policy::{EpsilonSchedule, epsilon_greedy, greedy_actions};
pub use state::{BallSnapshot, Quantizer, QuantizerConfig, StateKey, Vec2};
pub use value_table::{ActionValues, StateEntry, ValueTable};
