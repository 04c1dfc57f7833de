//! Strongly-typed identifiers.
//!
//! Each identifier is a thin wrapper around a UUID with a phantom marker so
//! identifiers for different entities cannot be mixed up. They show up in
//! logs to correlate a session or router across events.
//!
//! # Examples
//!
//! ```
//! use keyhole_core::id::{RouterId, SessionId};
//!
//! let session_id = SessionId::new();
//! let router_id = RouterId::new();
//! assert_ne!(session_id.to_string(), router_id.to_string());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A type-safe identifier based on UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

/// Marker type for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionMarker;
/// Identifier for an authentication session.
pub type SessionId = Id<SessionMarker>;

/// Marker type for routers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouterMarker;
/// Identifier for a registered router.
pub type RouterId = Id<RouterMarker>;
