//! Application router.

use keyhole_core::error::{Result, RouteError};
use keyhole_core::id::RouterId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::guard::{Binding, BoundRoute, GuardMode, RouteGuard};
use crate::registry::{Rebuild, RouterRegistry};
use crate::route::{Controller, Request, Response, RouteDecl};

/// One row of a resolved route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// The route pattern.
    pub pattern: String,

    /// The handler currently serving it.
    pub handler: String,

    /// The restriction guarding it, in expression form.
    pub restriction: Option<String>,
}

/// A router dispatching paths to controller handlers through a guard.
pub struct AppRouter {
    id: RouterId,
    routes: Vec<RouteDecl>,
    controller: Controller,
    guard: RouteGuard,
    table: RwLock<Vec<BoundRoute>>,
}

impl AppRouter {
    /// Build a router and its route table.
    ///
    /// # Errors
    ///
    /// Any `RouteError` raised while binding the table.
    pub fn new(routes: Vec<RouteDecl>, controller: Controller, guard: RouteGuard) -> Result<Self> {
        let table = build_table(&routes, &controller, &guard)?;
        let router = Self {
            id: RouterId::new(),
            routes,
            controller,
            guard,
            table: RwLock::new(table),
        };
        info!(router = %router.id, routes = router.routes.len(), mode = ?router.guard.mode(), "Router created");
        Ok(router)
    }

    /// Build a router and register it so it is rebuilt on session changes.
    pub fn registered(
        routes: Vec<RouteDecl>,
        controller: Controller,
        guard: RouteGuard,
        registry: &RouterRegistry,
    ) -> Result<Arc<Self>> {
        let router = Arc::new(Self::new(routes, controller, guard)?);
        registry.register_router(&router);
        Ok(router)
    }

    /// The router's identifier.
    pub fn id(&self) -> RouterId {
        self.id
    }

    /// The guard mode in use.
    pub fn mode(&self) -> GuardMode {
        self.guard.mode()
    }

    /// The declared routes.
    pub fn declarations(&self) -> &[RouteDecl] {
        &self.routes
    }

    /// The route table as it would serve requests right now.
    pub fn routes(&self) -> Vec<RouteSummary> {
        self.table
            .read()
            .iter()
            .map(|route| RouteSummary {
                pattern: route.decl.pattern.clone(),
                handler: self.guard.resolve(route).to_string(),
                restriction: route.decl.restriction.as_ref().map(ToString::to_string),
            })
            .collect()
    }

    /// Dispatch `path` to the first route matching it.
    ///
    /// # Errors
    ///
    /// `RouteError::NoRoute` if no route matches.
    pub fn dispatch(&self, path: &str) -> Result<Response> {
        let (request, handler_name) = {
            let table = self.table.read();
            let (route, params) = table
                .iter()
                .find_map(|route| route.matches(path).map(|params| (route, params)))
                .ok_or_else(|| RouteError::NoRoute(path.to_string()))?;

            let session = self.guard.evaluator().session();
            let request = Request {
                path: path.to_string(),
                pattern: route.decl.pattern.clone(),
                params,
                principal: session.principal(),
                config: session.config(),
            };
            (request, self.guard.resolve(route).to_string())
        };

        let handler = self
            .controller
            .get(&handler_name)
            .ok_or_else(|| RouteError::MissingHandler {
                route: request.pattern.clone(),
                method: handler_name.clone(),
            })?;
        debug!(router = %self.id, path, handler = %handler_name, "Dispatching");
        Ok(handler(&request))
    }
}

impl Rebuild for AppRouter {
    fn rebuild_routes(&self) -> Result<()> {
        let table = build_table(&self.routes, &self.controller, &self.guard)?;
        let denied = table
            .iter()
            .filter(|route| route.binding == Binding::NotAuthorized)
            .count();
        *self.table.write() = table;
        info!(router = %self.id, denied, "Route table rebuilt");
        Ok(())
    }
}

fn build_table(
    routes: &[RouteDecl],
    controller: &Controller,
    guard: &RouteGuard,
) -> Result<Vec<BoundRoute>> {
    routes
        .iter()
        .map(|decl| guard.bind(decl, controller))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_core::error::Error;
    use keyhole_policy::{PolicyEvaluator, Restriction, Session};

    fn router(session: Arc<Session>, mode: GuardMode) -> AppRouter {
        let controller = Controller::new()
            .handler("showHome", |_: &Request| Response::rendered("home"))
            .handler("showUser", |request: &Request| {
                Response::rendered(format!("user {}", request.param("id").unwrap_or("?")))
            })
            .handler("showDashboard", |_: &Request| Response::rendered("dashboard"));
        let routes = vec![
            RouteDecl::new("", "showHome"),
            RouteDecl::new("users/:id", "showUser"),
            RouteDecl::new("admin", "showDashboard").with_restriction(Restriction::has_role("ADMIN")),
        ];
        AppRouter::new(routes, controller, RouteGuard::new(PolicyEvaluator::new(session), mode))
            .unwrap()
    }

    #[test]
    fn test_dispatch_with_params() {
        let router = router(Arc::new(Session::new()), GuardMode::PerDispatch);
        assert_eq!(router.dispatch("/").unwrap(), Response::rendered("home"));
        assert_eq!(router.dispatch("users/7").unwrap(), Response::rendered("user 7"));
    }

    #[test]
    fn test_no_route() {
        let router = router(Arc::new(Session::new()), GuardMode::PerDispatch);
        let err = router.dispatch("missing/page").unwrap_err();
        assert!(matches!(err, Error::Route(RouteError::NoRoute(_))));
    }

    #[test]
    fn test_denied_route_redirects() {
        let router = router(Arc::new(Session::new()), GuardMode::PerDispatch);
        assert_eq!(router.dispatch("admin").unwrap(), Response::redirect("/401.html"));
    }

    #[test]
    fn test_route_summaries() {
        let router = router(Arc::new(Session::new()), GuardMode::Eager);
        let routes = router.routes();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[2].handler, "notAuthorized");
        assert_eq!(routes[2].restriction.as_deref(), Some("hasRole('ADMIN')"));
    }

    #[test]
    fn test_build_fails_on_missing_handler() {
        let result = AppRouter::new(
            vec![RouteDecl::new("x", "nothing")],
            Controller::new(),
            RouteGuard::new(PolicyEvaluator::new(Arc::new(Session::new())), GuardMode::Eager),
        );
        assert!(matches!(
            result,
            Err(Error::Route(RouteError::MissingHandler { .. }))
        ));
    }
}
