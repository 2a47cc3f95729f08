//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod bootstrap;
pub mod build;
pub mod checksum;
pub mod config;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Build(args) => build::run(ctx, args),
        Commands::Bootstrap(args) => bootstrap::run(ctx, args),
        Commands::Checksum(args) => checksum::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
    }
}
