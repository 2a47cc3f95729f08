//! repogen bootstrap - Create the repository addon descriptor

use clap::Args;

use crate::app::AppContext;
use crate::error::{RepoError, Result};
use crate::output::emit_json;
use crate::repository::{bootstrap, BootstrapOutcome, RepositoryLayout};

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Overwrite an existing descriptor
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &BootstrapArgs) -> Result<()> {
    let Some(repository) = ctx.config.repository.as_ref() else {
        return Err(RepoError::MissingConfig("repository.id".to_string()));
    };

    let layout = RepositoryLayout::new(&ctx.root, &ctx.config);
    let outcome = bootstrap::bootstrap(&layout, Some(repository), args.force)?;

    if ctx.robot_mode {
        return emit_json(&outcome);
    }

    match &outcome {
        BootstrapOutcome::Created(path) => println!("Created {}", path.display()),
        BootstrapOutcome::AlreadyPresent(path) => {
            println!("{} already exists (use --force to overwrite)", path.display());
        }
        BootstrapOutcome::NotConfigured => println!("No [repository] section configured"),
    }
    Ok(())
}
