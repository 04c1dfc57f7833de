//! # Keyhole Router
//!
//! `keyhole_router` guards navigable routes. Each route may carry a
//! restriction; a route whose restriction is denied is served by the
//! controller's `notAuthorized` handler instead of its declared target.
//!
//! Restrictions are evaluated per dispatch by default. In eager mode the
//! decision is made when the table is built, and the [`RouterRegistry`]
//! rebuilds registered routers whenever the session logs in or out.
//!
//! ```
//! use std::sync::Arc;
//! use keyhole_policy::{Credential, PolicyEvaluator, Restriction, Session};
//! use keyhole_router::{AppRouter, Controller, GuardMode, Request, Response, RouteDecl, RouteGuard};
//!
//! let session = Arc::new(Session::new());
//! let controller = Controller::new()
//!     .handler("showDashboard", |_: &Request| Response::rendered("dashboard"));
//! let routes = vec![
//!     RouteDecl::new("admin", "showDashboard").with_restriction(Restriction::has_role("ADMIN")),
//! ];
//! let guard = RouteGuard::new(PolicyEvaluator::new(session.clone()), GuardMode::PerDispatch);
//! let router = AppRouter::new(routes, controller, guard).unwrap();
//!
//! assert_eq!(router.dispatch("admin").unwrap(), Response::redirect("/401.html"));
//! session.authenticate(Some(Credential::new("x", ["ADMIN"]))).unwrap();
//! assert_eq!(router.dispatch("admin").unwrap(), Response::rendered("dashboard"));
//! ```

pub mod guard;
pub mod pattern;
pub mod registry;
pub mod route;
pub mod router;

pub use guard::{Binding, BoundRoute, GuardMode, RouteGuard};
pub use pattern::RoutePattern;
pub use registry::{Rebuild, RouterRegistry};
pub use route::{Controller, Handler, Request, Response, RouteDecl, NOT_AUTHORIZED};
pub use router::{AppRouter, RouteSummary};
