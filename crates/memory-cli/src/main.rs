//! vector-memory
//!
//! Store, fetch and search embedding records from the command line.
//!
//! # Usage
//!
//! ```bash
//! vector-memory collections create docs --vector-size 3
//! vector-memory upsert docs records.json
//! vector-memory get docs Id Id2
//! vector-memory search docs --embedding 0.1,0.2,0.3 --limit 5
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/vector-memory/config.toml)
//! 3. `--config` file
//! 4. Environment variables (VECTOR_MEMORY_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use memory_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
