//! CLI module for mainloop - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
