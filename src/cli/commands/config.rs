//! repogen config - Show the effective configuration

use clap::Args;

use crate::app::AppContext;
use crate::error::Result;
use crate::output::emit_json;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

pub fn run(ctx: &AppContext, _args: &ConfigArgs) -> Result<()> {
    if ctx.robot_mode {
        return emit_json(&ctx.config);
    }

    let rendered = ctx.config.to_toml_string()?;
    println!("{rendered}");
    Ok(())
}
