//! repogen checksum - Double-check a published manifest

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::error::Result;
use crate::output::emit_json;
use crate::repository::checksum;

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// File to hash
    pub file: PathBuf,

    /// Also write <FILE>.md5 next to it
    #[arg(long)]
    pub write: bool,
}

#[derive(Serialize)]
struct ChecksumOutput<'a> {
    path: &'a PathBuf,
    digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ChecksumArgs) -> Result<()> {
    let (digest, written) = if args.write {
        let file = checksum::write_checksum(&args.file)?;
        (file.digest, Some(file.path))
    } else {
        (checksum::digest_file(&args.file)?, None)
    };

    if ctx.robot_mode {
        return emit_json(ChecksumOutput {
            path: &args.file,
            digest,
            written,
        });
    }

    // Same layout as md5sum so the line can be fed to `md5sum -c`.
    println!("{digest}  {}", args.file.display());
    if let Some(path) = written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
