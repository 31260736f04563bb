mod cli;
mod config;
mod convert;
mod logging;
mod model;
mod predict_cmd;
mod presets;
mod report;
mod run_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run_cmd::run(args),
        Command::Predict(args) => predict_cmd::run(args),
        Command::Presets => {
            for (name, summary) in presets::PRESETS {
                println!("{name:<24} {summary}");
            }
            Ok(())
        }
    }
}
