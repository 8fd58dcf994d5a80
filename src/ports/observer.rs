//! Observer port - abstraction for training observation and data collection
//!
//! Observers are composed into the training pipeline to collect data without
//! coupling the driver loop to output formats.

use crate::{Result, agent::Agent};

/// Summary of one driver tick, handed to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickEvent {
    /// Tick counter (0-based)
    pub tick: u64,
    /// Sum of the rewards collected during this tick
    pub reward: f64,
    /// Number of reward events during this tick
    pub reward_events: usize,
    /// Whether the ball was lost during this tick
    pub game_over: bool,
    /// Exploration rate used for the decision
    pub epsilon: f64,
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_steps)` - once; `None` for unbounded runs
/// 2. `on_tick(event, agent)` - every tick
/// 3. `on_game_over(tick, game_overs)` - whenever the ball is lost
/// 4. `on_training_end(agent)` - once
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_steps: Option<u64>) -> Result<()> {
        Ok(())
    }

    /// Called after the agent decided on a tick.
    fn on_tick(&mut self, _event: &TickEvent, _agent: &Agent) -> Result<()> {
        Ok(())
    }

    /// Called when the ball reached the game-over region.
    fn on_game_over(&mut self, _tick: u64, _game_overs: u64) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    fn on_training_end(&mut self, _agent: &Agent) -> Result<()> {
        Ok(())
    }
}
