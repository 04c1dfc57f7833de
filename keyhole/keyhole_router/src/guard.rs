//! Route guarding.
//!
//! The guard binds each declared route to the handler that should serve it.
//! Unrestricted routes go straight to their target. Restricted routes are
//! either decided at bind time ([`GuardMode::Eager`], which makes the table
//! stale once the session changes) or carry their restriction into the
//! table and are decided at every dispatch ([`GuardMode::PerDispatch`]).

use keyhole_core::error::{Result, RouteError};
use keyhole_policy::{PolicyEvaluator, Restriction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pattern::RoutePattern;
use crate::route::{Controller, RouteDecl, NOT_AUTHORIZED};

/// When route restrictions are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// Evaluate on every dispatch.
    #[default]
    PerDispatch,

    /// Evaluate once when the table is built.
    Eager,
}

/// How a route in a built table is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Served by the declared target.
    Target,

    /// Served by the not-authorized handler.
    NotAuthorized,

    /// Decided at dispatch time.
    Guarded(Restriction),
}

/// A route bound by the guard.
#[derive(Debug, Clone)]
pub struct BoundRoute {
    /// The declaration it came from.
    pub decl: RouteDecl,

    /// The compiled pattern.
    pub pattern: RoutePattern,

    /// How it is served.
    pub binding: Binding,
}

impl BoundRoute {
    /// Match `path` against this route.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        self.pattern.matches(path)
    }
}

/// Binds route declarations to controller handlers.
#[derive(Clone)]
pub struct RouteGuard {
    evaluator: PolicyEvaluator,
    mode: GuardMode,
}

impl RouteGuard {
    /// Create a guard deciding with `evaluator`.
    pub fn new(evaluator: PolicyEvaluator, mode: GuardMode) -> Self {
        Self { evaluator, mode }
    }

    /// The guard's mode.
    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// The evaluator used for decisions.
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Bind one route.
    ///
    /// # Errors
    ///
    /// `RouteError::MissingHandler` if the controller lacks the declared
    /// target or, for a restricted route, the `notAuthorized` handler.
    /// `RouteError::InvalidPattern` if the pattern does not compile.
    pub fn bind(&self, decl: &RouteDecl, controller: &Controller) -> Result<BoundRoute> {
        let require = |method: &str| -> Result<()> {
            if controller.has_handler(method) {
                Ok(())
            } else {
                Err(RouteError::MissingHandler {
                    route: decl.pattern.clone(),
                    method: method.to_string(),
                }
                .into())
            }
        };

        require(&decl.target)?;
        let pattern = RoutePattern::parse(&decl.pattern)?;

        let binding = match &decl.restriction {
            None => Binding::Target,
            Some(restriction) => {
                require(NOT_AUTHORIZED)?;
                match self.mode {
                    GuardMode::PerDispatch => Binding::Guarded(restriction.clone()),
                    GuardMode::Eager if self.evaluator.evaluate(restriction) => Binding::Target,
                    GuardMode::Eager => Binding::NotAuthorized,
                }
            }
        };

        Ok(BoundRoute {
            decl: decl.clone(),
            pattern,
            binding,
        })
    }

    /// The handler that serves `route` right now.
    pub fn resolve<'r>(&self, route: &'r BoundRoute) -> &'r str {
        let granted = match &route.binding {
            Binding::Target => true,
            Binding::NotAuthorized => false,
            Binding::Guarded(restriction) => self.evaluator.evaluate(restriction),
        };
        if granted {
            route.decl.target.as_str()
        } else {
            NOT_AUTHORIZED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Request, Response};
    use keyhole_core::error::Error;
    use keyhole_policy::{Credential, Session};
    use std::sync::Arc;

    fn controller() -> Controller {
        Controller::new().handler("showDashboard", |_: &Request| Response::rendered("dashboard"))
    }

    fn admin_route() -> RouteDecl {
        RouteDecl::new("admin", "showDashboard").with_restriction(Restriction::has_role("ADMIN"))
    }

    #[test]
    fn test_eager_binding_reflects_session() {
        let session = Arc::new(Session::new());
        let guard = RouteGuard::new(PolicyEvaluator::new(session.clone()), GuardMode::Eager);

        let bound = guard.bind(&admin_route(), &controller()).unwrap();
        assert_eq!(bound.binding, Binding::NotAuthorized);
        assert_eq!(guard.resolve(&bound), NOT_AUTHORIZED);

        session.authenticate(Some(Credential::new("x", ["ADMIN"]))).unwrap();
        assert_eq!(guard.resolve(&bound), NOT_AUTHORIZED);
        let rebound = guard.bind(&admin_route(), &controller()).unwrap();
        assert_eq!(guard.resolve(&rebound), "showDashboard");
    }

    #[test]
    fn test_per_dispatch_binding_follows_session() {
        let session = Arc::new(Session::new());
        let guard = RouteGuard::new(PolicyEvaluator::new(session.clone()), GuardMode::PerDispatch);

        let bound = guard.bind(&admin_route(), &controller()).unwrap();
        assert_eq!(guard.resolve(&bound), NOT_AUTHORIZED);

        session.authenticate(Some(Credential::new("x", ["ADMIN"]))).unwrap();
        assert_eq!(guard.resolve(&bound), "showDashboard");
    }

    #[test]
    fn test_missing_target() {
        let guard = RouteGuard::new(PolicyEvaluator::new(Arc::new(Session::new())), GuardMode::Eager);
        let err = guard
            .bind(&RouteDecl::new("reports", "showReports"), &controller())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Route(RouteError::MissingHandler { ref method, .. }) if method == "showReports"
        ));
    }

    #[test]
    fn test_missing_not_authorized_handler() {
        let guard = RouteGuard::new(PolicyEvaluator::new(Arc::new(Session::new())), GuardMode::default());
        let mut controller = controller();
        controller.remove(NOT_AUTHORIZED);

        assert!(guard.bind(&RouteDecl::new("home", "showDashboard"), &controller).is_ok());
        let err = guard.bind(&admin_route(), &controller).unwrap_err();
        assert!(matches!(
            err,
            Error::Route(RouteError::MissingHandler { ref method, .. }) if method == NOT_AUTHORIZED
        ));
    }
}
