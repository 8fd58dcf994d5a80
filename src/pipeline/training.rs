//! Training pipeline: the driver loop around an [`Agent`] and an [`Environment`]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    agent::Agent,
    ports::{Environment, Observer, PolicyRepository, TickEvent},
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Simulated seconds per tick
    pub time_step: f64,

    /// Ticks to run; 0 runs until the process is stopped
    pub max_steps: u64,

    /// Save the policy every N ticks; 0 saves only at the end
    pub save_interval: u64,

    /// Prune uninformative states every N ticks; 0 never prunes
    pub clear_interval: u64,

    /// Respawn the ball after this many consecutive ticks outside the
    /// capture frame; 0 disables the guard
    pub respawn_after_stuck: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_steps: 100_000,
            save_interval: 10_000,
            clear_interval: 0,
            respawn_after_stuck: 600,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("time step must be positive, got {}", self.time_step),
            });
        }
        Ok(())
    }

    /// Total ticks as seen by observers.
    pub fn total_steps(&self) -> Option<u64> {
        (self.max_steps > 0).then_some(self.max_steps)
    }
}

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Ticks simulated
    pub steps: u64,

    /// Balls lost
    pub game_overs: u64,

    /// Reward events observed (every collision that fired)
    pub reward_events: u64,

    /// Sum of all rewards observed
    pub rewards_collected: f64,

    /// Respawns forced by the stuck-ball guard
    pub stuck_respawns: u64,

    /// Policy saves that succeeded
    pub saves: u64,

    /// States in the final table
    pub states: usize,

    /// States whose values moved away from the default
    pub informative_states: usize,

    /// Exploration rate at the last tick
    pub final_epsilon: f64,

    /// Rewards per tick
    pub reward_rate: f64,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    steps: u64,
    game_overs: u64,
    reward_events: u64,
    rewards_collected: f64,
    stuck_respawns: u64,
    saves: u64,
    ticks_outside_capture: u64,
    last_epsilon: f64,
}

/// Drives an agent against an environment, tick by tick.
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
    repository: Option<(Box<dyn PolicyRepository>, PathBuf)>,
    stop: Option<Arc<AtomicBool>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            repository: None,
            stop: None,
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Persist the policy to `path` through `repository` at every checkpoint
    /// and when the run ends.
    pub fn with_repository<P: AsRef<Path>>(
        mut self,
        repository: Box<dyn PolicyRepository>,
        path: P,
    ) -> Self {
        self.repository = Some((repository, path.as_ref().to_path_buf()));
        self
    }

    /// End the run after the current tick once `flag` is set, e.g. from a
    /// signal handler. The final save still happens.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run the driver loop until `max_steps` ticks have been simulated or
    /// the stop flag is set.
    ///
    /// Each tick steps the environment, lets the agent decide on the fresh
    /// snapshot with the tick's rewards, and notifies observers. A lost ball
    /// is respawned and the agent's pending decisions are dropped.
    ///
    /// The table is saved when the loop ends, including when an observer
    /// error aborts it; that error is returned after the save.
    pub fn run(&mut self, agent: &mut Agent, env: &mut dyn Environment) -> Result<TrainingResult> {
        self.config.validate()?;

        let total = self.config.total_steps();
        for observer in &mut self.observers {
            observer.on_training_start(total)?;
        }
        info!(
            max_steps = self.config.max_steps,
            states = agent.table().len(),
            "training started"
        );

        let mut counters = RunCounters {
            last_epsilon: agent.epsilon(0),
            ..Default::default()
        };
        let driven = self.drive(agent, env, &mut counters);

        // saved even when an observer failed mid-run
        self.checkpoint(agent, &mut counters);
        if let Err(error) = driven {
            warn!(steps = counters.steps, %error, "training aborted");
            return Err(error);
        }

        for observer in &mut self.observers {
            observer.on_training_end(agent)?;
        }

        let result = TrainingResult {
            steps: counters.steps,
            game_overs: counters.game_overs,
            reward_events: counters.reward_events,
            rewards_collected: counters.rewards_collected,
            stuck_respawns: counters.stuck_respawns,
            saves: counters.saves,
            states: agent.table().len(),
            informative_states: agent.table().informative_len(),
            final_epsilon: counters.last_epsilon,
            reward_rate: if counters.steps > 0 {
                counters.rewards_collected / counters.steps as f64
            } else {
                0.0
            },
        };
        info!(
            steps = result.steps,
            game_overs = result.game_overs,
            states = result.states,
            "training finished"
        );
        Ok(result)
    }

    /// The tick loop. Stops early on the first observer error.
    fn drive(
        &mut self,
        agent: &mut Agent,
        env: &mut dyn Environment,
        counters: &mut RunCounters,
    ) -> Result<()> {
        let total = self.config.total_steps();
        let mut tick: u64 = 0;
        while total.is_none_or(|max| tick < max) {
            if self.stop_requested() {
                info!(tick, "stop requested");
                break;
            }

            let outcome = env.step(self.config.time_step);
            let state = agent.state_key(&env.snapshot());
            counters.last_epsilon = agent.epsilon(tick);
            agent.think(state, &outcome.rewards, tick, &mut *env);

            let reward: f64 = outcome.rewards.iter().sum();
            counters.steps += 1;
            counters.reward_events += outcome.rewards.len() as u64;
            counters.rewards_collected += reward;

            let event = TickEvent {
                tick,
                reward,
                reward_events: outcome.rewards.len(),
                game_over: outcome.game_over,
                epsilon: counters.last_epsilon,
            };
            for observer in &mut self.observers {
                observer.on_tick(&event, agent)?;
            }

            if outcome.game_over {
                counters.game_overs += 1;
                counters.ticks_outside_capture = 0;
                env.respawn_ball();
                agent.forget_recent();
                debug!(tick, game_overs = counters.game_overs, "ball lost");
                for observer in &mut self.observers {
                    observer.on_game_over(tick, counters.game_overs)?;
                }
            } else {
                self.guard_stuck_ball(tick, agent, env, counters);
            }

            let done = tick + 1;
            if self.config.save_interval > 0 && done % self.config.save_interval == 0 {
                self.checkpoint(agent, counters);
            }
            if self.config.clear_interval > 0 && done % self.config.clear_interval == 0 {
                let removed = agent.clear_states();
                info!(
                    tick,
                    removed,
                    remaining = agent.table().len(),
                    "pruned uninformative states"
                );
            }

            tick += 1;
        }
        Ok(())
    }

    fn guard_stuck_ball(
        &self,
        tick: u64,
        agent: &mut Agent,
        env: &mut dyn Environment,
        counters: &mut RunCounters,
    ) {
        if env.in_capture_frame() {
            counters.ticks_outside_capture = 0;
            return;
        }
        counters.ticks_outside_capture += 1;
        let limit = self.config.respawn_after_stuck;
        if limit > 0 && counters.ticks_outside_capture >= limit {
            debug!(tick, ticks = counters.ticks_outside_capture, "ball stuck, respawning");
            env.respawn_ball();
            agent.forget_recent();
            counters.ticks_outside_capture = 0;
            counters.stuck_respawns += 1;
        }
    }

    /// Save the table if a repository is attached. Failures are logged and
    /// the run continues.
    fn checkpoint(&self, agent: &Agent, counters: &mut RunCounters) {
        let Some((repository, path)) = &self.repository else {
            return;
        };
        match repository.save(agent.table(), path) {
            Ok(()) => {
                counters.saves += 1;
                debug!(path = %path.display(), states = agent.table().len(), "policy saved");
            }
            Err(error) => warn!(path = %path.display(), %error, "failed to save policy"),
        }
    }
}
