use std::sync::Arc;

use keyhole_core::error::{Error, PolicyError, SessionError};
use keyhole_core::types::roles::{self, RoleSet};
use keyhole_policy::{AuthState, Credential, PolicyAudit, PolicyEvaluator, Restriction, Session};
use proptest::collection::vec;
use proptest::prelude::*;

#[test]
fn test_sessions_are_independent() {
    let admin = Arc::new(Session::new());
    let guest = Arc::new(Session::new());
    admin
        .authenticate(Some(Credential::new("root", ["ADMIN"])))
        .unwrap();

    let restriction = Restriction::has_role("ADMIN");
    assert!(PolicyEvaluator::new(admin).evaluate(&restriction));
    assert!(!PolicyEvaluator::new(guest).evaluate(&restriction));
}

#[test]
fn test_failed_login_keeps_previous_principal() {
    let session = Session::new();
    session
        .authenticate(Some(Credential::new("alice", ["EDITOR"])))
        .unwrap();

    let err = session.authenticate(None).unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::AuthenticationFailed)));
    assert_eq!(session.principal().as_deref(), Some("alice"));
    assert!(session.roles().unwrap().contains("EDITOR"));
}

#[test]
fn test_logout_denies_everything() {
    let session = Arc::new(Session::new());
    let evaluator = PolicyEvaluator::new(session.clone());
    session
        .authenticate(Some(Credential::new("alice", ["EDITOR"])))
        .unwrap();
    assert!(evaluator.evaluate_expression("hasNoRoles('ADMIN')").unwrap());

    session.invalidate();
    assert_eq!(session.snapshot(), AuthState::Anonymous);
    assert!(!evaluator.evaluate_expression("hasNoRoles('ADMIN')").unwrap());
}

#[test]
fn test_malformed_expression_surfaces_when_authenticated() {
    let session = Arc::new(Session::new());
    session
        .authenticate(Some(Credential::new("alice", ["EDITOR"])))
        .unwrap();
    let err = PolicyEvaluator::new(session)
        .evaluate_expression("hasRole('EDITOR'")
        .unwrap_err();
    assert!(matches!(err, Error::Policy(PolicyError::Parse { .. })));
}

#[test]
fn test_audit_separates_principals() {
    let session = Arc::new(Session::new());
    let audit = PolicyAudit::new(8);
    let evaluator = PolicyEvaluator::new(session.clone()).with_audit(audit.clone());

    evaluator.evaluate(&Restriction::has_role("ADMIN"));
    session
        .authenticate(Some(Credential::new("alice", ["ADMIN"])))
        .unwrap();
    evaluator.evaluate(&Restriction::has_role("ADMIN"));

    assert_eq!(audit.decisions_for(None).len(), 1);
    assert!(!audit.decisions_for(None)[0].granted);
    assert!(audit.decisions_for(Some("alice"))[0].granted);
    assert_eq!(audit.all_decisions().len(), 2);
}

fn role_names() -> impl Strategy<Value = Vec<String>> {
    vec(prop::sample::select(vec!["ADMIN", "EDITOR", "VIEWER", "GUEST"]), 0..4)
        .prop_map(|names| names.into_iter().map(str::to_string).collect())
}

proptest! {
    #[test]
    fn prop_expression_matches_predicate(held in role_names(), wanted in role_names()) {
        let session = Arc::new(Session::new());
        session.authenticate(Some(Credential::new("p", held.iter().cloned()))).unwrap();
        let evaluator = PolicyEvaluator::new(session);
        let held: RoleSet = held.into_iter().collect();

        let quoted: Vec<String> = wanted.iter().map(|role| format!("'{}'", role)).collect();
        let list = quoted.join(",");

        prop_assert_eq!(
            evaluator.evaluate_expression(&format!("hasRole([{}])", list)).unwrap(),
            roles::has_role(Some(&held), wanted.clone())
        );
        prop_assert_eq!(
            evaluator.evaluate_expression(&format!("hasAllRoles([{}])", list)).unwrap(),
            roles::has_all_roles(Some(&held), wanted.clone())
        );
        prop_assert_eq!(
            evaluator.evaluate_expression(&format!("hasNoRoles([{}])", list)).unwrap(),
            roles::has_no_roles(Some(&held), wanted)
        );
    }
}
