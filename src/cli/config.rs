//! Shared configuration types for CLI commands

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{agent::AgentConfig, pipeline::TrainingConfig};

/// Decaying exploration given as `<MIN>:<STEPS>` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonDecay {
    /// Exploration rate reached at the end of the decay
    pub min: f64,
    /// Ticks until `min` is reached
    pub steps: u64,
}

impl FromStr for EpsilonDecay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, steps) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <MIN>:<STEPS>, got '{s}'"))?;
        let min: f64 = min
            .trim()
            .parse()
            .map_err(|_| format!("invalid minimum epsilon '{min}'"))?;
        let steps: u64 = steps
            .trim()
            .replace('_', "")
            .parse()
            .map_err(|_| format!("invalid step count '{steps}'"))?;
        Ok(Self { min, steps })
    }
}

impl fmt::Display for EpsilonDecay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min, self.steps)
    }
}

/// Everything a training run was started with, as echoed in summaries.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub agent: AgentConfig,
    pub training: TrainingConfig,
    /// Where the policy is loaded from and saved to
    pub policy_path: PathBuf,
    /// Stats log, if enabled
    pub stats_path: Option<PathBuf>,
    /// Ticks between stats rows
    pub log_interval: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsilon_decay() {
        let decay: EpsilonDecay = "0.01:1_000_000".parse().unwrap();
        assert_eq!(decay.min, 0.01);
        assert_eq!(decay.steps, 1_000_000);
        assert_eq!(decay.to_string(), "0.01:1000000");
    }

    #[test]
    fn test_parse_epsilon_decay_rejects_garbage() {
        assert!("0.01".parse::<EpsilonDecay>().is_err());
        assert!("x:10".parse::<EpsilonDecay>().is_err());
        assert!("0.1:-5".parse::<EpsilonDecay>().is_err());
    }
}
