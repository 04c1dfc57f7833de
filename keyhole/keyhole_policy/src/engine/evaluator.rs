//! Policy evaluation engine.
//!
//! Evaluates restrictions against the roles held by a session. Anonymous
//! sessions are denied every restricted resource without the restriction
//! being inspected.

use keyhole_core::error::Result;
use keyhole_core::types::roles::Candidates;
use std::sync::Arc;
use tracing::debug;

use super::audit::PolicyAudit;
use crate::model::{Decision, Policy, Restriction};
use crate::parser::RestrictionParser;
use crate::session::{AuthState, Session};

/// Policy evaluation engine bound to one session.
#[derive(Clone)]
pub struct PolicyEvaluator {
    /// The session whose roles are checked.
    session: Arc<Session>,

    /// Optional decision log.
    audit: Option<PolicyAudit>,
}

impl PolicyEvaluator {
    /// Create an evaluator for `session`.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            audit: None,
        }
    }

    /// Create an evaluator for the process-wide session.
    pub fn global() -> Self {
        Self::new(Session::global())
    }

    /// Record every decision in `audit`.
    pub fn with_audit(mut self, audit: PolicyAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The session this evaluator reads.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The attached audit, if any.
    pub fn audit(&self) -> Option<&PolicyAudit> {
        self.audit.as_ref()
    }

    /// Evaluate a parsed restriction.
    ///
    /// Denial is a normal outcome, never an error.
    pub fn evaluate(&self, restriction: &Restriction) -> bool {
        let (principal, granted) = self.session.with_state(|state| match state {
            AuthState::Anonymous => (None, false),
            AuthState::Authenticated { principal, roles } => {
                (Some(principal.clone()), restriction.check(Some(roles)))
            }
        });
        self.record(principal, restriction.to_string(), granted);
        granted
    }

    /// Parse and evaluate a restriction expression.
    ///
    /// Anonymous sessions get `Ok(false)` without the expression being parsed.
    ///
    /// # Errors
    ///
    /// `PolicyError::Parse` or `PolicyError::UnknownPolicy` when the session
    /// is authenticated and the expression is malformed or names an unknown
    /// predicate.
    pub fn evaluate_expression(&self, expression: &str) -> Result<bool> {
        if !self.session.is_authenticated() {
            self.record(None, expression.trim().to_string(), false);
            return Ok(false);
        }
        let restriction = RestrictionParser::parse(expression)?;
        Ok(self.evaluate(&restriction))
    }

    /// Apply a predicate to candidates that may be computed at check time.
    ///
    /// Dynamic candidates are resolved before the session is read.
    pub fn check(&self, policy: Policy, candidates: impl Into<Candidates>) -> bool {
        let candidates = candidates.into().resolve();
        let restriction = Restriction::new(policy, candidates.iter().cloned());
        self.evaluate(&restriction)
    }

    fn record(&self, principal: Option<String>, restriction: String, granted: bool) {
        debug!(
            session = %self.session.id(),
            principal = principal.as_deref().unwrap_or("<anonymous>"),
            %restriction,
            granted,
            "Restriction evaluated"
        );
        if let Some(audit) = &self.audit {
            audit.record(Decision::new(principal, restriction, granted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Credential;
    use keyhole_core::error::{Error, PolicyError};
    use keyhole_core::types::roles::RoleName;

    fn evaluator_with(roles: &[&str]) -> PolicyEvaluator {
        let session = Arc::new(Session::new());
        session
            .authenticate(Some(Credential::new("x", roles.iter().copied())))
            .unwrap();
        PolicyEvaluator::new(session)
    }

    #[test]
    fn test_evaluate_all_roles() {
        let restriction = Restriction::has_all_roles(["ADMIN", "EDITOR"]);
        assert!(!evaluator_with(&["ADMIN"]).evaluate(&restriction));
        assert!(evaluator_with(&["ADMIN", "EDITOR"]).evaluate(&restriction));
    }

    #[test]
    fn test_anonymous_denied_without_parsing() {
        let evaluator = PolicyEvaluator::new(Arc::new(Session::new()));
        assert!(!evaluator.evaluate(&Restriction::has_no_roles(["ADMIN"])));
        assert!(!evaluator.evaluate_expression("hasNoRoles('ADMIN')").unwrap());
        assert!(!evaluator.evaluate_expression("not even close").unwrap());
    }

    #[test]
    fn test_unknown_policy_surfaced() {
        let evaluator = evaluator_with(&["ADMIN"]);
        let err = evaluator.evaluate_expression("isAdmin('ADMIN')").unwrap_err();
        assert!(matches!(err, Error::Policy(PolicyError::UnknownPolicy(_))));
    }

    #[test]
    fn test_dynamic_candidates() {
        let evaluator = evaluator_with(&["EDITOR"]);
        let candidates = Candidates::provider(|| vec![RoleName::from("EDITOR")]);
        assert!(evaluator.check(Policy::HasAnyRole, candidates.clone()));
        assert!(!evaluator.check(Policy::HasNoRoles, candidates));
    }

    #[test]
    fn test_decisions_audited() {
        let audit = PolicyAudit::new(10);
        let evaluator = evaluator_with(&["ADMIN"]).with_audit(audit.clone());

        evaluator.evaluate(&Restriction::has_role("ADMIN"));
        evaluator.evaluate(&Restriction::has_role("EDITOR"));

        let decisions = audit.decisions_for(Some("x"));
        assert_eq!(decisions.len(), 2);
        assert!(decisions[0].granted);
        assert!(!decisions[1].granted);
        assert_eq!(decisions[1].restriction, "hasRole('EDITOR')");
    }
}
