mod app;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;

use crate::app::{Cli, Command};

/// Exit code of a run in which at least one image could not be dumped
const EXIT_PARTIAL_FAILURE: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show il2scope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("il2scope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Dump {
            snapshot,
            output_dir,
            selection,
        } => {
            let summary = commands::dump::run(snapshot, output_dir, selection, &cli.global)?;
            if summary.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
            }
        }
        Command::Info { snapshot } => {
            commands::info::run(snapshot, &cli.global)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
