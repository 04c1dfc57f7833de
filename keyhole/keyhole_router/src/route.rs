//! Route declarations, controllers and responses.

use keyhole_core::utils::config::SecureConfig;
use keyhole_policy::Restriction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Name of the handler denied routes are bound to.
pub const NOT_AUTHORIZED: &str = "notAuthorized";

/// One entry of a route table as declared by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecl {
    /// Path pattern, e.g. `users/:id`.
    pub pattern: String,

    /// Name of the controller handler serving the route.
    pub target: String,

    /// Restriction guarding the route, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Restriction>,
}

impl RouteDecl {
    /// An unrestricted route.
    pub fn new(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
            restriction: None,
        }
    }

    /// Guard the route with `restriction`.
    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }
}

/// A dispatched request as seen by a handler.
#[derive(Debug, Clone)]
pub struct Request {
    /// The path that was dispatched.
    pub path: String,

    /// The pattern that matched it.
    pub pattern: String,

    /// Parameters captured by the pattern.
    pub params: BTreeMap<String, String>,

    /// The logged-in principal at dispatch time.
    pub principal: Option<String>,

    /// The session configuration at dispatch time.
    pub config: SecureConfig,
}

impl Request {
    /// A captured parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Rendered content.
    Rendered {
        /// The rendered body.
        body: String,
    },

    /// Navigate elsewhere.
    Redirect {
        /// Where to go.
        location: String,
    },
}

impl Response {
    /// A rendered response.
    pub fn rendered(body: impl Into<String>) -> Self {
        Self::Rendered { body: body.into() }
    }

    /// A redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rendered { body } => f.write_str(body),
            Self::Redirect { location } => write!(f, "redirect {}", location),
        }
    }
}

/// A route handler.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Named route handlers.
///
/// A new controller already has a `notAuthorized` handler redirecting to
/// the session's not-authorized location. It can be replaced or removed.
#[derive(Clone)]
pub struct Controller {
    handlers: HashMap<String, Handler>,
}

impl Controller {
    /// A controller holding only the default `notAuthorized` handler.
    pub fn new() -> Self {
        let mut controller = Self {
            handlers: HashMap::new(),
        };
        controller.insert(NOT_AUTHORIZED, |request: &Request| {
            Response::redirect(&request.config.not_authorized_location)
        });
        controller
    }

    /// Builder form of [`Controller::insert`].
    pub fn handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Register a handler, replacing any with the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Remove a handler, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Whether a handler with this name exists.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Handler names, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("handlers", &self.handler_names())
            .finish()
    }
}
