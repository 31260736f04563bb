//! Run command: simulate a chain and report visit statistics.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crate::cli::{RunArgs, SourceArgs};
use crate::config::ModelFile;
use crate::model::Model;
use crate::{convert, presets, report};

/// Loads the model named by `source`.
pub fn load_model(source: &SourceArgs, seed: Option<u64>) -> Result<Model> {
    match (&source.model, &source.preset) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading model file");
            let file = ModelFile::load(path)?;
            convert::build_model(&file, seed)
                .with_context(|| format!("failed to build model from {}", path.display()))
        }
        (None, Some(name)) => {
            info!(preset = %name, "using preset");
            presets::build(name, seed)
        }
        (None, None) => anyhow::bail!("either --model or --preset is required"),
    }
}

/// Run a simulation and print the summary.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("run").entered();
    let mut model = load_model(&args.source, args.seed)?;
    info!(
        description = model.description(),
        order = model.order(),
        steps = args.steps,
        "simulating"
    );

    let summary = model.run(args.steps)?;
    info!(
        entropy = summary.entropy,
        longest_streak = summary.longest_streak,
        "simulation complete"
    );

    if args.json {
        println!("{}", report::to_json(&summary)?);
    } else {
        print!("{}", report::render_summary(&summary));
    }
    Ok(())
}
