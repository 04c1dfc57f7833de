//! # Keyhole Policy
//!
//! `keyhole_policy` is the policy engine of Keyhole: the authentication
//! session, the restriction expression parser and the evaluator that
//! decides whether the current principal satisfies a restriction.
//!
//! Key concepts:
//!
//! 1. **Session**: who is logged in and which roles they hold.
//!
//! 2. **Restriction**: a policy predicate plus role arguments, written as
//!    `hasRole('ADMIN')` or `hasAllRoles(['ADMIN','EDITOR'])`.
//!
//! 3. **Evaluation**: checking a restriction against a session. Anonymous
//!    sessions are always denied.
//!
//! ```
//! use std::sync::Arc;
//! use keyhole_policy::{Credential, PolicyEvaluator, Session};
//!
//! let session = Arc::new(Session::new());
//! let evaluator = PolicyEvaluator::new(session.clone());
//! assert!(!evaluator.evaluate_expression("hasRole('ADMIN')").unwrap());
//!
//! session.authenticate(Some(Credential::new("x", ["ADMIN"]))).unwrap();
//! assert!(evaluator.evaluate_expression("hasRole('ADMIN')").unwrap());
//! ```

pub mod engine;
pub mod model;
pub mod parser;
pub mod session;

// Re-export key types for convenience
pub use engine::{PolicyAudit, PolicyEvaluator};
pub use model::{Decision, Policy, Restriction};
pub use parser::RestrictionParser;
pub use session::{AuthState, Credential, Session, SessionObserver};
