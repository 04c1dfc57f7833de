//! Router registry.
//!
//! Routers whose tables depend on the session register here. When the
//! session logs in or out, the registry rebuilds every live router in
//! registration order. The registry never keeps a router alive.

use keyhole_core::error::Result;
use keyhole_policy::{Session, SessionObserver};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{error, info};

static GLOBAL_REGISTRY: Lazy<Arc<RouterRegistry>> = Lazy::new(|| {
    let registry = Arc::new(RouterRegistry::new());
    registry.observe(&Session::global());
    registry
});

/// A router that can rebuild its route table.
pub trait Rebuild: Send + Sync {
    /// Rebuild the route table against the current session.
    fn rebuild_routes(&self) -> Result<()>;
}

/// Registered routers, held weakly.
#[derive(Default)]
pub struct RouterRegistry {
    routers: RwLock<Vec<Weak<dyn Rebuild>>>,
}

impl RouterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, observing `Session::global()`.
    pub fn global() -> Arc<RouterRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Rebuild registered routers whenever `session` changes.
    pub fn observe(self: &Arc<Self>, session: &Session) {
        session.subscribe(self);
    }

    /// Append a router.
    pub fn register(&self, router: Weak<dyn Rebuild>) {
        self.routers.write().push(router);
    }

    /// Append a router held in an `Arc`.
    pub fn register_router<R>(&self, router: &Arc<R>)
    where
        R: Rebuild + 'static,
    {
        let weak = Arc::downgrade(router);
        let weak: Weak<dyn Rebuild> = weak;
        self.register(weak);
    }

    /// Number of registered routers still alive.
    pub fn len(&self) -> usize {
        self.routers
            .read()
            .iter()
            .filter(|router| router.strong_count() > 0)
            .count()
    }

    /// Whether no live router is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild every live router, in registration order, and forget the
    /// dropped ones.
    ///
    /// Returns the number of routers rebuilt. Stops at the first router
    /// that fails to rebuild.
    pub fn refresh_all(&self) -> Result<usize> {
        let live: Vec<Arc<dyn Rebuild>> = {
            let mut routers = self.routers.write();
            routers.retain(|router| router.strong_count() > 0);
            routers.iter().filter_map(Weak::upgrade).collect()
        };

        for router in &live {
            router.rebuild_routes()?;
        }
        info!(rebuilt = live.len(), "Route tables refreshed");
        Ok(live.len())
    }
}

impl SessionObserver for RouterRegistry {
    fn session_changed(&self, session: &Session) {
        if let Err(err) = self.refresh_all() {
            error!(session = %session.id(), error = %err, "Failed to refresh route tables");
        }
    }
}
