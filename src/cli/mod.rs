//! CLI module for dealflow - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for a full evaluation run,
//! a standalone persona check, and printing the decision checklist.

pub mod commands;

pub use commands::Cli;
