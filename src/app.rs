//! Per-invocation context shared by all commands.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::output::{OutputDecision, OutputDetector, OutputRequest};

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
    pub output: OutputDecision,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref(), &cli.root)?;
        let output = OutputDetector::new(OutputRequest {
            robot: cli.robot,
            force_plain: cli.force_plain(),
            force_styled: cli.force_styled(),
            config_styled: config.output.styled,
        })
        .decide();

        Ok(Self {
            root: cli.root.clone(),
            config,
            robot_mode: cli.robot,
            output,
        })
    }
}
