//! Inspect command - Summarize a saved policy

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    adapters::repository_for_path,
    agent::{Action, Quantizer, QuantizerConfig, ValueTable},
    cli::output::{format_number, print_kv, print_section, print_subsection},
};

#[derive(Parser, Debug)]
#[command(about = "Summarize a saved policy")]
pub struct InspectArgs {
    /// Policy file (`.msgpack` for binary, anything else is delimited text)
    #[arg(long, short = 'p')]
    pub policy: PathBuf,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Mean value of one action over the states that store it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSummary {
    pub action: Action,
    pub states: usize,
    pub mean_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySummary {
    pub states: usize,
    pub informative_states: usize,
    pub actions: Vec<ActionSummary>,
}

impl PolicySummary {
    pub fn of(table: &ValueTable) -> Self {
        let actions = Action::ALL
            .iter()
            .filter_map(|&action| {
                let values: Vec<f64> = table
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .values
                            .iter()
                            .find(|(stored, _)| *stored == action)
                            .map(|(_, value)| value)
                    })
                    .collect();
                (!values.is_empty()).then(|| ActionSummary {
                    action,
                    states: values.len(),
                    mean_value: values.iter().sum::<f64>() / values.len() as f64,
                })
            })
            .collect();

        Self {
            states: table.len(),
            informative_states: table.informative_len(),
            actions,
        }
    }
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let repository = repository_for_path(&args.policy, Quantizer::new(QuantizerConfig::default()));
    let table = repository
        .load(&args.policy)
        .with_context(|| format!("failed to load policy {}", args.policy.display()))?;
    let summary = PolicySummary::of(&table);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_section(&format!("Policy {}", args.policy.display()));
    print_kv("States", &format_number(summary.states as u64));
    print_kv(
        "Informative states",
        &format_number(summary.informative_states as u64),
    );

    print_subsection("Mean value per action");
    for entry in &summary.actions {
        print_kv(
            entry.action.uid(),
            &format!(
                "{:.6} over {} states",
                entry.mean_value,
                format_number(entry.states as u64)
            ),
        );
    }

    Ok(())
}
