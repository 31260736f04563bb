use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Discrete-time Markov chain simulator.
#[derive(Parser)]
#[command(
    name = "chainsim",
    version,
    about = "Simulate and analyse discrete-time Markov chains"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Simulate a chain and report visit statistics.
    Run(RunArgs),
    /// Compute exact n-step transition probabilities.
    Predict(PredictArgs),
    /// List the built-in models.
    Presets,
}

/// Where the model comes from: exactly one of a file or a preset.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Path to a TOML model file.
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Name of a built-in model (see `chainsim presets`).
    #[arg(short, long)]
    pub preset: Option<String>,
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of steps to simulate.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub steps: usize,

    /// Override the RNG seed from the model file.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `predict` subcommand.
#[derive(clap::Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of steps ahead.
    #[arg(short, long, allow_negative_numbers = true)]
    pub n: i64,

    /// Print the state distribution at every step up to n, starting from
    /// the model's start state.
    #[arg(short, long)]
    pub trajectory: bool,

    /// Override the RNG seed used to draw a random start state.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}
