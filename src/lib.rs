//! Tabular reinforcement learning for pinball flippers
//!
//! This crate provides:
//! - A quantized state space over ball kinematics and a sorted value table
//! - Epsilon-greedy flipper control with windowed backward credit assignment
//! - Policy persistence as delimited text or MessagePack
//! - A lightweight 2D pinball table to train against
//! - A training pipeline with checkpoints, progress and a stats log

pub mod adapters;
pub mod agent;
pub mod cli;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod ports;
pub mod sim;

pub use agent::{Action, Agent, AgentConfig, StateKey, ValueTable};
pub use error::{Error, Result};
