//! The `check` command.

use anyhow::{Context, Result};
use clap::Args;

use super::App;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Restriction expression, e.g. "hasRole('ADMIN')"
    #[clap(long)]
    pub restriction: String,
}

/// Evaluate the restriction and report `granted` or `denied`.
pub fn execute(app: &App, args: &CheckArgs) -> Result<String> {
    let granted = app
        .evaluator
        .evaluate_expression(&args.restriction)
        .with_context(|| format!("Failed to evaluate '{}'", args.restriction))?;
    Ok(if granted { "granted" } else { "denied" }.to_string())
}
