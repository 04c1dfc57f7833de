//! Command implementations.
//!
//! Every command runs against an [`App`]: a session built from the
//! configuration file and the login flags, plus an evaluator reading it.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use keyhole_policy::{Credential, PolicyEvaluator, Session};

use crate::config::KeyholeConfig;

pub mod check;
pub mod enforce;
pub mod routes;

/// How the session should be logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Login {
    /// Use the `[session]` section, if any.
    FromConfig,

    /// Stay anonymous regardless of configuration.
    Anonymous,

    /// Log in as the configured principal with these roles instead.
    Roles(Vec<String>),

    /// Log in as `principal` with `roles`.
    As {
        /// Principal name.
        principal: String,

        /// Roles held.
        roles: Vec<String>,
    },
}

/// Shared state for one command invocation.
pub struct App {
    /// The session commands evaluate against.
    pub session: Arc<Session>,

    /// Evaluator bound to the session.
    pub evaluator: PolicyEvaluator,
}

impl App {
    /// Configure and log in a fresh session.
    pub fn build(config: &KeyholeConfig, login: &Login) -> Result<Self> {
        let session = Arc::new(Session::new());
        session
            .configure(&config.secure)
            .context("Invalid [secure] configuration")?;

        let credential = match login {
            Login::Anonymous => None,
            Login::FromConfig => config.credential(),
            Login::As { principal, roles } => {
                Some(Credential::new(principal.clone(), roles.iter().cloned()))
            }
            Login::Roles(roles) => match &config.session.principal {
                Some(principal) => Some(Credential::new(principal.clone(), roles.iter().cloned())),
                None => bail!("--role requires --principal or a [session] principal"),
            },
        };
        if credential.is_some() {
            session
                .authenticate(credential)
                .context("Failed to authenticate")?;
        }

        let evaluator = PolicyEvaluator::new(session.clone());
        Ok(Self { session, evaluator })
    }
}
