//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// repogen - Build a Kodi addon repository from a folder of addons
#[derive(Parser, Debug)]
#[command(name = "repogen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub robot: bool,

    /// Force plain output (no colors)
    #[arg(long, global = true)]
    pub plain: bool,

    /// Color mode: auto, always, never
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: <root>/repogen.toml over ~/.config/repogen/config.toml)
    #[arg(long, global = true, env = "REPOGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository root holding one folder per addon
    #[arg(long, global = true, env = "REPOGEN_ROOT", default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl Cli {
    /// Check if plain mode is forced via CLI flags or color mode.
    #[must_use]
    pub fn force_plain(&self) -> bool {
        self.plain || self.color == Some(ColorMode::Never)
    }

    /// Check if styled mode is forced via CLI flags.
    #[must_use]
    pub fn force_styled(&self) -> bool {
        self.color == Some(ColorMode::Always)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the output folder: addons.xml, its checksum and one zip per addon
    Build(commands::build::BuildArgs),

    /// Create the repository's own addon.xml from the [repository] config
    Bootstrap(commands::bootstrap::BootstrapArgs),

    /// Print (and optionally write) the MD5 checksum of a file
    Checksum(commands::checksum::ChecksumArgs),

    /// Show the effective configuration
    Config(commands::config::ConfigArgs),
}
