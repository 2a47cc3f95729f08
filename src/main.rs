//! repogen - Kodi addon repository generator
//!
//! Zips every addon folder under the repository root and writes the
//! `addons.xml` / `addons.xml.md5` pair clients read.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repogen::app::AppContext;
use repogen::cli::Cli;
use repogen::output::robot_error;
use repogen::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = %e.code(), "{e}");
            if cli.robot {
                // Robot mode: JSON error envelope on stdout
                let response = robot_error(&e);
                println!("{}", serde_json::to_string(&response).unwrap_or_default());
            } else {
                eprintln!("Error: {}", e.to_structured());
                eprintln!("Hint: {}", e.code().suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    repogen::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,repogen=info",
        1 => "info,repogen=debug",
        2 => "debug,repogen=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
