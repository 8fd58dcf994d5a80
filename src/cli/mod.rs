//! CLI infrastructure for the pinball bot
//!
//! This module provides the command-line interface for training an agent on
//! the simulated table and inspecting saved policies.

pub mod commands;
pub mod config;
pub mod output;
