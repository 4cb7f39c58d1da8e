//! CLI infrastructure for the smartcab simulator
//!
//! This module provides the command-line interface for training a learning
//! agent and comparing update rules against baseline drivers.

pub mod commands;
pub mod output;
