//! vector-memory command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Settings, logging, backend selection and command handlers

pub mod cli;
pub mod commands;

pub use cli::{BackendArg, Cli, CollectionCommands, Commands};
pub use commands::{execute, init_logging, load_settings, open_client, read_records, run};
