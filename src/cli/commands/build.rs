//! repogen build - Rebuild the repository output

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::config::{normalize_extensions, Config};
use crate::error::Result;
use crate::output::reporter_for;
use crate::pipeline::Pipeline;

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Output directory name inside the root (default: _zips)
    #[arg(long, value_name = "DIR")]
    pub output: Option<String>,

    /// Comma separated extensions to leave out of archives; replaces the configured list
    #[arg(long, value_name = "EXTS")]
    pub exclude: Option<String>,

    /// Store archive entries without compression
    #[arg(long)]
    pub no_compress: bool,

    /// Package addons on all cores
    #[arg(long)]
    pub parallel: bool,
}

impl BuildArgs {
    /// Layer the flags over the loaded configuration.
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(output) = &self.output {
            config.output.dir.clone_from(output);
        }
        if let Some(exclude) = &self.exclude {
            config.build.excludes = normalize_extensions(exclude.split(','));
        }
        if self.no_compress {
            config.build.compress = false;
        }
        if self.parallel {
            config.build.parallel = true;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run(ctx: &AppContext, args: &BuildArgs) -> Result<()> {
    let config = args.apply(ctx.config.clone())?;
    debug!(?config, "Effective build configuration");

    let reporter = reporter_for(ctx.output.mode);
    reporter.banner(crate::VERSION);

    let report = Pipeline::new(&ctx.root, &config, reporter.as_ref()).run()?;
    reporter.finish(&report);
    Ok(())
}
