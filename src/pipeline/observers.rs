//! Observer implementations for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! the driver loop to specific output formats.

use std::time::Instant;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{
    Result,
    agent::Agent,
    export::{StatsLogger, StatsRow},
    ports::{Observer, TickEvent},
};

/// Ticks between progress bar redraws.
const PROGRESS_REFRESH: u64 = 256;

/// Progress bar observer - Shows training progress
///
/// Draws a bar for bounded runs and a spinner for unbounded ones.
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    game_overs: u64,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            game_overs: 0,
        }
    }

    fn message(&self, agent: &Agent) -> String {
        format!(
            "lost {} | states {}",
            self.game_overs,
            agent.table().len()
        )
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_steps: Option<u64>) -> Result<()> {
        let pb = match total_steps {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps ({msg})")
                        .map_err(|e| crate::Error::ProgressBarTemplate {
                            message: e.to_string(),
                        })?
                        .progress_chars("=>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {pos} steps ({msg})")
                        .map_err(|e| crate::Error::ProgressBarTemplate {
                            message: e.to_string(),
                        })?,
                );
                pb
            }
        };
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_tick(&mut self, event: &TickEvent, agent: &Agent) -> Result<()> {
        if (event.tick + 1) % PROGRESS_REFRESH == 0 {
            if let Some(pb) = &self.progress_bar {
                pb.set_position(event.tick + 1);
                pb.set_message(self.message(agent));
            }
        }
        Ok(())
    }

    fn on_game_over(&mut self, _tick: u64, game_overs: u64) -> Result<()> {
        self.game_overs = game_overs;
        Ok(())
    }

    fn on_training_end(&mut self, agent: &Agent) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message(agent));
        }
        Ok(())
    }
}

/// Stats observer - Appends a row to the stats log every `interval` ticks
///
/// On start, an existing log is archived under a timestamped name and a
/// fresh one with a header row is created.
pub struct StatsObserver {
    logger: StatsLogger,
    interval: u64,
    interval_start: Instant,
    interval_steps: u64,
    interval_rewards: f64,
    steps: u64,
    total_rewards: f64,
    game_overs: u64,
    last_epsilon: f64,
}

impl StatsObserver {
    /// Create a stats observer. An `interval` of 0 is treated as 1.
    pub fn new(logger: StatsLogger, interval: u64) -> Self {
        Self {
            logger,
            interval: interval.max(1),
            interval_start: Instant::now(),
            interval_steps: 0,
            interval_rewards: 0.0,
            steps: 0,
            total_rewards: 0.0,
            game_overs: 0,
            last_epsilon: 0.0,
        }
    }

    fn flush(&mut self, agent: &Agent) -> Result<()> {
        if self.interval_steps == 0 {
            return Ok(());
        }
        let elapsed = self.interval_start.elapsed().as_secs_f64() * 1e6;
        let row = StatsRow {
            steps: self.steps,
            time: Local::now().to_rfc3339(),
            states: agent.table().len(),
            avg_step_micros: elapsed / self.interval_steps as f64,
            epsilon: self.last_epsilon,
            rewards_collected: self.interval_rewards,
            reward_rate: StatsRow::normalize_reward(self.interval_rewards, self.interval_steps),
            game_overs: self.game_overs,
            // balls played includes the one still in play
            score: self.total_rewards / (self.game_overs + 1) as f64,
        };
        self.logger.log(&row)?;

        self.interval_start = Instant::now();
        self.interval_steps = 0;
        self.interval_rewards = 0.0;
        Ok(())
    }
}

impl Observer for StatsObserver {
    fn on_training_start(&mut self, _total_steps: Option<u64>) -> Result<()> {
        if let Some(archived) = self.logger.archive_log()? {
            info!(path = %archived.display(), "archived previous stats log");
        }
        self.logger.init_log()?;
        self.interval_start = Instant::now();
        Ok(())
    }

    fn on_tick(&mut self, event: &TickEvent, agent: &Agent) -> Result<()> {
        self.steps += 1;
        self.interval_steps += 1;
        self.interval_rewards += event.reward;
        self.total_rewards += event.reward;
        self.last_epsilon = event.epsilon;
        // counted here so a row flushed on this tick already includes it
        if event.game_over {
            self.game_overs += 1;
        }

        if self.steps % self.interval == 0 {
            self.flush(agent)?;
        }
        Ok(())
    }

    fn on_training_end(&mut self, agent: &Agent) -> Result<()> {
        self.flush(agent)
    }
}
