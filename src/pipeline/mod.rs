//! Training pipeline
//!
//! The driver loop that steps an environment, feeds the agent, checkpoints
//! the policy, and reports to observers.

pub mod observers;
pub mod training;

pub use observers::{ProgressObserver, StatsObserver};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;

