//! Policy evaluation engine.
//!
//! This module provides the evaluator and the decision audit.

mod audit;
mod evaluator;

pub use audit::PolicyAudit;
pub use evaluator::PolicyEvaluator;
