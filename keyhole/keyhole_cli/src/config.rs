//! Configuration file for the `keyhole` binary.
//!
//! ```toml
//! [session]
//! principal = "alice"
//! roles = ["ADMIN"]
//!
//! [secure]
//! secure_tag = "data-secure"
//! not_authorized_location = "/401.html"
//!
//! [logging]
//! level = "info"
//!
//! [router]
//! mode = "per_dispatch"
//!
//! [[routes]]
//! pattern = "admin"
//! target = "showDashboard"
//! restriction = "hasRole('ADMIN')"
//! body = "<h1>Dashboard</h1>"
//! ```
//!
//! Every section is optional. Route restrictions are parsed when the file
//! is loaded, so a malformed one is reported before anything runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use keyhole_core::error::ConfigError;
use keyhole_core::utils::config::SecureOptions;
use keyhole_core::utils::logging::LogLevel;
use keyhole_policy::Credential;
use keyhole_router::{GuardMode, RouteDecl};
use serde::Deserialize;
use tracing::info;

/// Bootstrap credential for the session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Principal to log in as. The session stays anonymous when unset.
    pub principal: Option<String>,

    /// Roles held by the principal.
    pub roles: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Minimum level written to stderr.
    pub level: LogLevel,
}

/// Router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterSection {
    /// When route restrictions are evaluated.
    pub mode: GuardMode,
}

/// A declared route plus the markup its handler renders.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    /// The route declaration.
    #[serde(flatten)]
    pub decl: RouteDecl,

    /// Markup rendered by the target handler. `{{param}}` placeholders are
    /// filled from the matched path. Defaults to the target name.
    #[serde(default)]
    pub body: Option<String>,
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyholeConfig {
    /// Bootstrap credential.
    pub session: SessionSection,

    /// Secure-markup options merged into the session.
    pub secure: SecureOptions,

    /// Logging configuration.
    pub logging: LoggingSection,

    /// Router configuration.
    pub router: RouterSection,

    /// Route table.
    pub routes: Vec<RouteEntry>,
}

impl KeyholeConfig {
    /// Load configuration from `path`, or the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        info!(path = %path.display(), routes = config.routes.len(), "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.principal.is_none() && !self.session.roles.is_empty() {
            return Err(ConfigError::Invalid(
                "session roles given without a principal".to_string(),
            ));
        }
        if let Some(route) = self.routes.iter().find(|route| route.decl.target.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "route '{}' has no target",
                route.decl.pattern
            )));
        }
        Ok(())
    }

    /// The bootstrap credential, if a principal is configured.
    pub fn credential(&self) -> Option<Credential> {
        self.session
            .principal
            .as_ref()
            .map(|principal| Credential::new(principal.clone(), self.session.roles.iter().cloned()))
    }

    /// The route declarations.
    pub fn route_decls(&self) -> Vec<RouteDecl> {
        self.routes.iter().map(|route| route.decl.clone()).collect()
    }
}
