//! Fanout CLI library.
//!
//! This crate provides the command-line interface for fanout: flag parsing
//! and the run command that wires targets, the engine and the result file
//! together.

pub mod cli;
pub mod commands;
