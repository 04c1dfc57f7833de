//! The `routes` and `dispatch` commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use keyhole_dom::{DomEnforcer, MarkupTemplate, Template};
use keyhole_router::{AppRouter, Controller, Request, Response, RouteGuard, RouterRegistry};
use tracing::warn;

use super::App;
use crate::config::KeyholeConfig;

/// Arguments for the routes command
#[derive(Args)]
pub struct RoutesArgs {
    /// Print the table as JSON
    #[clap(long)]
    pub json: bool,
}

/// Arguments for the dispatch command
#[derive(Args)]
pub struct DispatchArgs {
    /// Path to dispatch, e.g. "users/42"
    #[clap(long)]
    pub path: String,
}

/// One handler per route target, rendering the route's body.
fn controller(config: &KeyholeConfig) -> Controller {
    let mut controller = Controller::new();
    for route in &config.routes {
        let template = MarkupTemplate::new(
            route
                .body
                .clone()
                .unwrap_or_else(|| route.decl.target.clone()),
        );
        controller.insert(route.decl.target.clone(), move |request: &Request| {
            let params = serde_json::to_value(&request.params).unwrap_or_default();
            match template.render(&params) {
                Ok(body) => Response::rendered(body),
                Err(err) => {
                    warn!(path = %request.path, error = %err, "Failed to render route body");
                    Response::rendered(String::new())
                }
            }
        });
    }
    controller
}

fn build_router(app: &App, config: &KeyholeConfig) -> Result<(Arc<RouterRegistry>, Arc<AppRouter>)> {
    let registry = Arc::new(RouterRegistry::new());
    registry.observe(&app.session);
    let guard = RouteGuard::new(app.evaluator.clone(), config.router.mode);
    let router = AppRouter::registered(config.route_decls(), controller(config), guard, &registry)
        .context("Failed to build route table")?;
    Ok((registry, router))
}

/// Print each route with the handler currently serving it.
pub fn execute_routes(app: &App, config: &KeyholeConfig, args: &RoutesArgs) -> Result<String> {
    let (_registry, router) = build_router(app, config)?;
    let routes = router.routes();
    if args.json {
        return serde_json::to_string_pretty(&routes).context("Failed to serialize route table");
    }

    let lines: Vec<String> = routes
        .iter()
        .map(|route| {
            let pattern = if route.pattern.is_empty() { "/" } else { route.pattern.as_str() };
            match &route.restriction {
                Some(restriction) => format!("{} -> {} [{}]", pattern, route.handler, restriction),
                None => format!("{} -> {}", pattern, route.handler),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Dispatch a path and print the response. Rendered bodies are secured
/// before printing.
pub fn execute_dispatch(app: &App, config: &KeyholeConfig, args: &DispatchArgs) -> Result<String> {
    let (_registry, router) = build_router(app, config)?;
    let response = router
        .dispatch(&args.path)
        .with_context(|| format!("Failed to dispatch '{}'", args.path))?;

    match response {
        Response::Rendered { body } => DomEnforcer::new(app.evaluator.clone())
            .enforce_markup(&body)
            .context("Failed to secure response body"),
        redirect @ Response::Redirect { .. } => Ok(redirect.to_string()),
    }
}
