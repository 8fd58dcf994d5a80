//! Export of training data
//!
//! This module provides the `;`-separated stats log written during training.

pub mod stats_csv;

pub use stats_csv::{StatsLogger, StatsRow};
