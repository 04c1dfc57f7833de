//! # Keyhole Core
//!
//! `keyhole_core` provides the building blocks shared by every Keyhole crate:
//! the error hierarchy, typed identifiers, role names and the role-set
//! predicates, and the secure-markup configuration.
//!
//! Keyhole gates two kinds of resources in an interactive application:
//! navigable routes and rendered markup fragments. Both are protected by
//! restriction expressions such as `hasRole('ADMIN')` that are evaluated
//! against the roles held by the current session.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Keyhole components
//! - **id**: Strongly-typed identifier types
//! - **types**: Role names, role sets and the any/all/none predicates
//! - **utils**: Logging setup and configuration

pub mod error;
pub mod id;
pub mod types;
pub mod utils;

pub use error::{ConfigError, DomError, Error, PolicyError, Result, RouteError, SessionError};
pub use id::{RouterId, SessionId};
pub use types::{Candidates, RoleName, RoleSet};
pub use utils::{LogLevel, SecureConfig, SecureOptions};
