//! Predict command: exact n-step probabilities without simulating.

use anyhow::Result;
use tracing::{info, info_span};

use crate::cli::PredictArgs;
use crate::report;
use crate::run_cmd::load_model;

/// Print the n-step transition matrix, or the per-step distribution from
/// the start state when `--trajectory` is set.
pub fn run(args: PredictArgs) -> Result<()> {
    let _cmd = info_span!("predict").entered();
    let model = load_model(&args.source, args.seed)?;
    info!(
        description = model.description(),
        n = args.n,
        trajectory = args.trajectory,
        "predicting"
    );

    let text = if args.trajectory {
        let trajectory = model.trajectory(args.n)?;
        if args.json {
            report::to_json(&trajectory)?
        } else {
            report::render_trajectory(&trajectory)
        }
    } else {
        let prediction = model.predict(args.n)?;
        if args.json {
            report::to_json(&prediction)?
        } else {
            report::render_prediction(&prediction)
        }
    };
    print!("{text}");
    if args.json {
        println!();
    }
    Ok(())
}
