//! Train command - Run the agent on the simulated table

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, atomic::AtomicBool},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    adapters::{load_or_empty, repository_for_path},
    agent::{Agent, AgentConfig, Aggregate, EpsilonSchedule, Quantizer},
    cli::{
        config::{EpsilonDecay, RunConfig},
        output::{format_number, print_kv, print_section, print_stats_table},
    },
    export::StatsLogger,
    pipeline::{ProgressObserver, StatsObserver, TrainingConfig, TrainingPipeline, TrainingResult},
    sim::PinballTable,
};

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    config: &'a RunConfig,
    result: &'a TrainingResult,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Treat trailing separators or missing filename as a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train the flipper agent on the simulated table")]
pub struct TrainArgs {
    /// Policy file to resume from and save to (`.msgpack` for binary)
    #[arg(long, short = 'p', default_value = "policy.csv")]
    pub policy: PathBuf,

    /// Stats log written every --log-interval steps
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Ticks to simulate; 0 runs until interrupted (Ctrl-C saves and exits)
    #[arg(long, short = 's', default_value_t = 100_000)]
    pub steps: u64,

    /// Exploration rate (starting rate with --dynamic-epsilon)
    #[arg(long, short = 'e', default_value_t = 0.1)]
    pub explore_rate: f64,

    /// Decay exploration to MIN over STEPS ticks, given as MIN:STEPS
    #[arg(long)]
    pub dynamic_epsilon: Option<EpsilonDecay>,

    /// Number of recent decisions credited with each observation
    #[arg(long, short = 'b', default_value_t = 40)]
    pub backport_window: usize,

    /// Smoothing rate of value updates (0, 1]
    #[arg(long, short = 'a', default_value_t = 0.25)]
    pub alpha: f64,

    /// Use the maximum instead of the informative average as the no-reward target
    #[arg(long, default_value_t = false)]
    pub general_value: bool,

    /// Leave ball velocity out of the state key
    #[arg(long, default_value_t = false)]
    pub no_velocity: bool,

    /// Include flipper activity in the state key
    #[arg(long, default_value_t = false)]
    pub flippers: bool,

    /// Save the policy every N ticks (0 saves only at the end)
    #[arg(long, default_value_t = 10_000)]
    pub save_interval: u64,

    /// Write a stats row every N ticks
    #[arg(long, default_value_t = 1_000)]
    pub log_interval: u64,

    /// Prune states that never left the default value every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    pub clear_interval: u64,

    /// Respawn the ball after N consecutive ticks above the flippers (0 disables)
    #[arg(long, default_value_t = 600)]
    pub respawn_after_stuck: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show progress bar
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub progress: bool,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl TrainArgs {
    fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default()
            .with_alpha(self.alpha)
            .with_backport_window(self.backport_window)
            .with_epsilon(self.explore_rate)
            .with_include_velocity(!self.no_velocity)
            .with_include_flippers(self.flippers);
        if let Some(decay) = self.dynamic_epsilon {
            config = config.with_dynamic_epsilon(decay.min, decay.steps);
        }
        if self.general_value {
            config = config.with_aggregate(Aggregate::General);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }

    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            max_steps: self.steps,
            save_interval: self.save_interval,
            clear_interval: self.clear_interval,
            respawn_after_stuck: self.respawn_after_stuck,
            ..Default::default()
        }
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            agent: self.agent_config(),
            training: self.training_config(),
            policy_path: self.policy.clone(),
            stats_path: self.stats.clone(),
            log_interval: self.log_interval,
        }
    }
}

fn describe_schedule(schedule: &EpsilonSchedule) -> String {
    match schedule {
        EpsilonSchedule::Constant(epsilon) => format!("{epsilon}"),
        EpsilonSchedule::Decaying {
            initial,
            min,
            steps_until_min,
            ..
        } => format!(
            "{initial} -> {min} over {} steps",
            format_number(*steps_until_min)
        ),
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    execute_until(args, Arc::new(AtomicBool::new(false)))
}

/// Like [`execute`], but the run ends (and the policy is saved) once `stop`
/// is set.
pub fn execute_until(args: TrainArgs, stop: Arc<AtomicBool>) -> Result<()> {
    let run = args.run_config();
    run.agent
        .validate()
        .context("invalid agent configuration")?;
    run.training
        .validate()
        .context("invalid training configuration")?;

    let repository = repository_for_path(
        &run.policy_path,
        Quantizer::new(run.agent.quantizer),
    );
    let table = load_or_empty(repository.as_ref(), &run.policy_path);
    let mut agent = Agent::new(run.agent.clone())?.with_table(table);

    let mut env = match args.seed {
        Some(seed) => PinballTable::with_seed(seed.wrapping_add(1)),
        None => PinballTable::default(),
    };

    print_section("Pinball Training");
    print_kv("Policy", &run.policy_path.display().to_string());
    print_kv("Known states", &format_number(agent.table().len() as u64));
    print_kv(
        "Steps",
        &if run.training.max_steps == 0 {
            "unbounded".to_string()
        } else {
            format_number(run.training.max_steps)
        },
    );
    print_kv("Epsilon", &describe_schedule(&run.agent.epsilon));
    print_kv("Alpha", &run.agent.alpha.to_string());
    print_kv("Backport window", &run.agent.backport_window.to_string());

    let mut pipeline = TrainingPipeline::new(run.training.clone())
        .with_repository(repository, &run.policy_path)
        .with_stop_flag(stop);
    if let Some(stats_path) = &run.stats_path {
        pipeline = pipeline.with_observer(Box::new(StatsObserver::new(
            StatsLogger::new(stats_path),
            run.log_interval,
        )));
    }
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    let result = pipeline
        .run(&mut agent, &mut env)
        .context("training run failed")?;

    print_section("Training Summary");
    print_stats_table(&[
        ("Steps", format_number(result.steps)),
        ("Balls lost", format_number(result.game_overs)),
        ("Stuck respawns", format_number(result.stuck_respawns)),
        ("Reward events", format_number(result.reward_events)),
        ("Rewards collected", format!("{:.2}", result.rewards_collected)),
        ("Reward rate", format!("{:.5}/step", result.reward_rate)),
        ("States", format_number(result.states as u64)),
        ("Informative states", format_number(result.informative_states as u64)),
        ("Final epsilon", format!("{:.4}", result.final_epsilon)),
        ("Policy saves", format_number(result.saves)),
    ]);

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        let file = File::create(&path)
            .with_context(|| format!("failed to create summary file {}", path.display()))?;
        let summary = TrainingSummaryFile {
            config: &run,
            result: &result,
        };
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", path.display());
    }

    Ok(())
}
