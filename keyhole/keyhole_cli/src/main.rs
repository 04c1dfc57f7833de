use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyhole_core::utils::logging::{init_logging, LogLevel};

mod commands;
mod config;

use commands::check::CheckArgs;
use commands::enforce::EnforceArgs;
use commands::routes::{DispatchArgs, RoutesArgs};
use commands::App;
use config::KeyholeConfig;

/// Keyhole Command Line Interface
///
/// Evaluates restriction expressions, secures markup and resolves guarded
/// routes for a principal given on the command line or in a config file.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Principal to authenticate as
    #[clap(long, global = true)]
    principal: Option<String>,

    /// Role held by the principal (repeatable)
    #[clap(long = "role", global = true)]
    roles: Vec<String>,

    /// Ignore any credential and stay anonymous
    #[clap(long, global = true, conflicts_with_all = ["principal", "roles"])]
    anonymous: bool,

    /// Log level written to stderr
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a restriction expression
    Check(CheckArgs),

    /// Secure a markup file
    Enforce(EnforceArgs),

    /// Print the resolved route table
    Routes(RoutesArgs),

    /// Dispatch a path through the route table
    Dispatch(DispatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = KeyholeConfig::load(cli.config.as_deref())?;
    init_logging(cli.log_level.unwrap_or(config.logging.level))
        .context("Failed to initialize logging")?;

    let app = App::build(&config, &cli.login())?;
    let output = match &cli.command {
        Commands::Check(args) => commands::check::execute(&app, args)?,
        Commands::Enforce(args) => commands::enforce::execute(&app, args)?,
        Commands::Routes(args) => commands::routes::execute_routes(&app, &config, args)?,
        Commands::Dispatch(args) => commands::routes::execute_dispatch(&app, &config, args)?,
    };
    println!("{}", output);
    Ok(())
}

impl Cli {
    fn login(&self) -> commands::Login {
        if self.anonymous {
            return commands::Login::Anonymous;
        }
        match &self.principal {
            Some(principal) => commands::Login::As {
                principal: principal.clone(),
                roles: self.roles.clone(),
            },
            None if !self.roles.is_empty() => commands::Login::Roles(self.roles.clone()),
            None => commands::Login::FromConfig,
        }
    }
}
