//! Policy models.
//!
//! Restrictions describe what a protected resource requires; decisions
//! record how a restriction was resolved for a principal.

pub mod decision;
pub mod restriction;

pub use decision::Decision;
pub use restriction::{Policy, Restriction};
