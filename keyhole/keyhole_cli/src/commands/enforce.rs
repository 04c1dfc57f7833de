//! The `enforce` command.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use keyhole_dom::{DomEnforcer, MarkupTemplate, Renderer};
use serde_json::Value;

use super::App;

/// Arguments for the enforce command
#[derive(Args)]
pub struct EnforceArgs {
    /// Markup file to secure, or `-` for stdin
    #[clap(long)]
    pub input: PathBuf,

    /// JSON object filling `{{key}}` placeholders in the markup
    #[clap(long)]
    pub data: Option<String>,
}

/// Render the input and print it with restrictions applied.
pub fn execute(app: &App, args: &EnforceArgs) -> Result<String> {
    let markup = if args.input.as_os_str() == "-" {
        let mut markup = String::new();
        io::stdin()
            .read_to_string(&mut markup)
            .context("Failed to read markup from stdin")?;
        markup
    } else {
        fs::read_to_string(&args.input)
            .with_context(|| format!("Failed to read {}", args.input.display()))?
    };

    let data: Value = match &args.data {
        Some(data) => serde_json::from_str(data).context("--data must be valid JSON")?,
        None => Value::Null,
    };

    let renderer = Renderer::new().with_enforcer(DomEnforcer::new(app.evaluator.clone()));
    renderer
        .render(&MarkupTemplate::new(markup), &data)
        .context("Failed to secure markup")
}
