//! Error types for the Keyhole access-control layer.
//!
//! Errors are organized by subsystem, with each subsystem having its own
//! error type. The root error type, `Error`, can wrap any of them so callers
//! can handle failures uniformly at the top level.
//!
//! An authorization *denial* is never an error. Only misconfiguration
//! (unknown policy, unknown action, missing handler, malformed expression)
//! and failed login attempts are reported here.

use thiserror::Error;

/// Root error type for Keyhole.
#[derive(Debug, Error)]
pub enum Error {
    /// Session-related errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Restriction parsing and evaluation errors
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Fragment enforcement errors
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    /// Route table errors
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors related to the authentication session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `authenticate` was called without a credential
    #[error("Authentication failed: no credential supplied")]
    AuthenticationFailed,
}

/// Errors related to restriction expressions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The restriction expression is malformed
    #[error("Malformed restriction '{expression}': {reason}")]
    Parse {
        /// The offending expression
        expression: String,

        /// What was wrong with it
        reason: String,
    },

    /// The restriction names a predicate that does not exist
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

/// Errors related to fragment enforcement.
#[derive(Debug, Error)]
pub enum DomError {
    /// The remediation action named on a node is not a built-in
    #[error("Unknown remediation action: {0}")]
    UnknownAction(String),

    /// The markup could not be parsed into a fragment
    #[error("Malformed markup at byte {offset}: {reason}")]
    Markup {
        /// Byte offset where parsing failed
        offset: usize,

        /// What was wrong with it
        reason: String,
    },

    /// No template is registered under the requested name
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

/// Errors related to route tables.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The effective target of a route is not a handler on the controller
    #[error("Method '{method}' was not found on the controller (route '{route}')")]
    MissingHandler {
        /// The route pattern being bound
        route: String,

        /// The handler name that could not be resolved
        method: String,
    },

    /// No route matches the requested path
    #[error("No route matches path: {0}")]
    NoRoute(String),

    /// A route pattern is malformed
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,

        /// What was wrong with it
        reason: String,
    },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load a configuration source
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// Failed to parse a configuration source
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// A recognized option carries an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type used throughout Keyhole.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = SessionError::AuthenticationFailed.into();
        assert!(matches!(err, Error::Session(_)));

        let err: Error = PolicyError::UnknownPolicy("hasRoles".to_string()).into();
        assert!(matches!(err, Error::Policy(PolicyError::UnknownPolicy(_))));

        let err: Error = DomError::UnknownAction("hide".to_string()).into();
        assert!(matches!(err, Error::Dom(_)));
    }

    #[test]
    fn test_error_display() {
        let err: Error = RouteError::MissingHandler {
            route: "admin".to_string(),
            method: "showAdmin".to_string(),
        }
        .into();
        let display = err.to_string();
        assert!(display.contains("Method 'showAdmin' was not found on the controller"));
    }
}
