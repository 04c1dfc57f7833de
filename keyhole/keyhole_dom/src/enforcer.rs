//! Restriction enforcement over markup fragments.
//!
//! The enforcer walks a fragment in document order, looking for elements
//! that carry the restriction attribute (`data-secure` by default). Each one
//! is evaluated against the session; denied elements are remediated with
//! the action named by the action attribute (`data-secure-action`,
//! defaulting to `remove`).

use keyhole_core::error::{Error, PolicyError, Result};
use keyhole_core::utils::config::SecureConfig;
use keyhole_policy::PolicyEvaluator;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::RemediationAction;
use crate::markup;
use crate::node::{Document, Element, Fragment, Node};

/// A protected element that was left untouched because its restriction
/// could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedNode {
    /// Tag name of the element.
    pub element: String,

    /// The raw restriction attribute value.
    pub restriction: String,

    /// Why the restriction was rejected.
    pub reason: String,
}

/// Summary of one enforcement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementReport {
    /// Protected elements examined.
    pub inspected: usize,

    /// Protected elements whose restriction was satisfied.
    pub granted: usize,

    /// Elements detached from the fragment.
    pub removed: usize,

    /// Elements marked disabled.
    pub disabled: usize,

    /// Elements skipped because of a malformed restriction.
    pub skipped: Vec<SkippedNode>,
}

impl EnforcementReport {
    /// Whether any element was changed.
    pub fn modified(&self) -> bool {
        self.removed > 0 || self.disabled > 0
    }
}

enum Outcome {
    Keep,
    Remove,
}

/// Applies restriction annotations to markup.
#[derive(Clone)]
pub struct DomEnforcer {
    evaluator: PolicyEvaluator,
}

impl DomEnforcer {
    /// Create an enforcer deciding with `evaluator`.
    pub fn new(evaluator: PolicyEvaluator) -> Self {
        Self { evaluator }
    }

    /// Create an enforcer for the process-wide session.
    pub fn global() -> Self {
        Self::new(PolicyEvaluator::global())
    }

    /// The evaluator used for decisions.
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Enforce every protected descendant of `fragment`.
    ///
    /// # Errors
    ///
    /// `DomError::UnknownAction` if a protected element names an action that
    /// does not exist, and `PolicyError::UnknownPolicy` if a restriction names
    /// an unknown predicate. Either aborts the pass; elements handled before
    /// the failure stay remediated.
    pub fn enforce(&self, fragment: &mut Fragment) -> Result<EnforcementReport> {
        self.enforce_children(&mut fragment.children)
    }

    /// Enforce the descendants of `element`. The element itself is not
    /// inspected.
    pub fn enforce_element(&self, element: &mut Element) -> Result<EnforcementReport> {
        self.enforce_children(&mut element.children)
    }

    /// Parse `markup`, enforce it and serialize the result.
    pub fn enforce_markup(&self, markup: &str) -> Result<String> {
        let mut fragment = markup::parse(markup)?;
        self.enforce(&mut fragment)?;
        Ok(markup::serialize(&fragment))
    }

    /// Re-enforce a whole document, typically after the session changed.
    pub fn sweep(&self, document: &mut Document) -> Result<EnforcementReport> {
        let report = self.enforce(document)?;
        debug!(
            session = %self.evaluator.session().id(),
            removed = report.removed,
            disabled = report.disabled,
            "Document swept"
        );
        Ok(report)
    }

    fn enforce_children(&self, nodes: &mut Vec<Node>) -> Result<EnforcementReport> {
        let config = self.evaluator.session().config();
        let mut report = EnforcementReport::default();
        self.walk(nodes, &config, &mut report)?;
        Ok(report)
    }

    fn walk(
        &self,
        nodes: &mut Vec<Node>,
        config: &SecureConfig,
        report: &mut EnforcementReport,
    ) -> Result<()> {
        let mut i = 0;
        while i < nodes.len() {
            let Node::Element(element) = &mut nodes[i] else {
                i += 1;
                continue;
            };
            match self.apply(element, config, report)? {
                Outcome::Remove => {
                    nodes.remove(i);
                }
                Outcome::Keep => {
                    self.walk(&mut element.children, config, report)?;
                    i += 1;
                }
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        element: &mut Element,
        config: &SecureConfig,
        report: &mut EnforcementReport,
    ) -> Result<Outcome> {
        let expression = match element.attribute(&config.secure_tag) {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => return Ok(Outcome::Keep),
        };
        report.inspected += 1;

        let action: RemediationAction = element
            .attribute(&config.secure_action_tag)
            .unwrap_or_default()
            .parse()?;

        let granted = match self.evaluator.evaluate_expression(&expression) {
            Ok(granted) => granted,
            Err(Error::Policy(PolicyError::Parse { reason, .. })) => {
                warn!(
                    element = %element.name,
                    restriction = %expression,
                    %reason,
                    "Skipping element with malformed restriction"
                );
                report.skipped.push(SkippedNode {
                    element: element.name.clone(),
                    restriction: expression,
                    reason,
                });
                return Ok(Outcome::Keep);
            }
            Err(err) => return Err(err),
        };

        if granted {
            report.granted += 1;
            return Ok(Outcome::Keep);
        }

        debug!(element = %element.name, restriction = %expression, %action, "Remediating element");
        match action {
            RemediationAction::Remove => {
                report.removed += 1;
                Ok(Outcome::Remove)
            }
            RemediationAction::Disable => {
                element.set_attribute(&config.disabled_attribute, "disabled");
                report.disabled += 1;
                Ok(Outcome::Keep)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_core::error::DomError;
    use keyhole_policy::{Credential, Session};
    use std::sync::Arc;

    fn anonymous_enforcer() -> DomEnforcer {
        DomEnforcer::new(PolicyEvaluator::new(Arc::new(Session::new())))
    }

    fn enforcer_with(roles: &[&str]) -> DomEnforcer {
        let session = Arc::new(Session::new());
        session
            .authenticate(Some(Credential::new("x", roles.iter().copied())))
            .unwrap();
        DomEnforcer::new(PolicyEvaluator::new(session))
    }

    #[test]
    fn test_denied_node_removed_with_subtree() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let mut fragment = markup::parse(
            "<div data-secure=\"hasAllRoles(['ADMIN','EDITOR'])\">\
             <span data-secure=\"hasRole('ADMIN')\">inner</span></div><p>kept</p>",
        )
        .unwrap();

        let report = enforcer.enforce(&mut fragment).unwrap();
        assert_eq!(report.inspected, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(markup::serialize(&fragment), "<p>kept</p>");
    }

    #[test]
    fn test_disable_keeps_node() {
        let enforcer = enforcer_with(&["USER"]);
        let mut fragment = markup::parse(
            "<button data-secure=\"hasRole('ADMIN')\" data-secure-action=\"disable\">Go</button>",
        )
        .unwrap();

        let report = enforcer.enforce(&mut fragment).unwrap();
        assert_eq!(report.disabled, 1);
        let button = fragment.children[0].as_element().unwrap();
        assert_eq!(button.attribute("disabled"), Some("disabled"));
        assert_eq!(button.text_content(), "Go");
    }

    #[test]
    fn test_root_element_not_inspected() {
        let enforcer = anonymous_enforcer();
        let mut root = Element::new("section")
            .with_attribute("data-secure", "hasRole('ADMIN')")
            .with_child(Element::new("a").with_attribute("data-secure", "hasRole('ADMIN')"));

        let report = enforcer.enforce_element(&mut root).unwrap();
        assert_eq!(report.removed, 1);
        assert!(root.children.is_empty());
        assert!(root.has_attribute("data-secure"));
    }

    #[test]
    fn test_malformed_restriction_skipped() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let mut fragment = markup::parse(
            "<a data-secure=\"hasRole('ADMIN'\">x</a><b data-secure=\"hasRole('EDITOR')\">y</b>",
        )
        .unwrap();

        let report = enforcer.enforce(&mut fragment).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].element, "a");
        assert_eq!(report.removed, 1);
        assert_eq!(fragment.children.len(), 1);
    }

    #[test]
    fn test_unknown_action_is_fatal_even_when_granted() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let mut fragment = markup::parse(
            "<a data-secure=\"hasRole('ADMIN')\" data-secure-action=\"hide\">x</a>",
        )
        .unwrap();

        let err = enforcer.enforce(&mut fragment).unwrap_err();
        assert!(matches!(err, Error::Dom(DomError::UnknownAction(_))));
    }

    #[test]
    fn test_unknown_policy_is_fatal() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let err = enforcer
            .enforce_markup("<a data-secure=\"isAdmin('ADMIN')\">x</a>")
            .unwrap_err();
        assert!(matches!(err, Error::Policy(PolicyError::UnknownPolicy(_))));
    }

    #[test]
    fn test_enforcement_is_idempotent() {
        let enforcer = anonymous_enforcer();
        let mut fragment = markup::parse(
            "<i data-secure=\"hasRole('A')\" data-secure-action=\"disable\"></i>\
             <b data-secure=\"hasRole('A')\"></b>",
        )
        .unwrap();

        enforcer.enforce(&mut fragment).unwrap();
        let once = fragment.clone();
        enforcer.sweep(&mut fragment).unwrap();
        assert_eq!(fragment, once);
    }

    #[test]
    fn test_empty_restriction_ignored() {
        let enforcer = anonymous_enforcer();
        let mut fragment = markup::parse("<a data-secure=\"\">x</a><b data-secure>y</b>").unwrap();
        let report = enforcer.enforce(&mut fragment).unwrap();
        assert_eq!(report.inspected, 0);
        assert_eq!(fragment.children.len(), 2);
    }

    #[test]
    fn test_global_enforcer_reads_global_session() {
        let enforcer = DomEnforcer::global();
        assert!(Arc::ptr_eq(enforcer.evaluator().session(), &Session::global()));
    }

    #[test]
    fn test_enforced_markup_is_stable_across_passes() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let markup = "<a data-secure='hasRole(\"ADMIN\")'>a</a>\
                      <b data-secure=\"hasRole('ADMIN')\" title='x \"y\" &amp; z'>b</b>\
                      <i data-secure=\"hasRole(&quot;ADMIN&quot;)\">i</i>\
                      <u data-secure=\"hasRole('EDITOR')\">u</u>";

        let once = enforcer.enforce_markup(markup).unwrap();
        let twice = enforcer.enforce_markup(&once).unwrap();
        assert_eq!(twice, once);
        assert_eq!(markup::parse(&once).unwrap().text_content(), "abi");
    }

    #[test]
    fn test_entity_escaped_restriction_granted() {
        let enforcer = enforcer_with(&["ADMIN"]);
        let output = enforcer
            .enforce_markup("<a data-secure=\"hasRole(&#39;ADMIN&#39;)\">x</a>")
            .unwrap();
        assert_eq!(output, "<a data-secure=\"hasRole('ADMIN')\">x</a>");
    }

    #[test]
    fn test_implicitly_closed_paragraphs_enforced() {
        let enforcer = enforcer_with(&["EDITOR"]);
        let output = enforcer
            .enforce_markup("<p>intro<p>more<a data-secure=\"hasRole('ADMIN')\">admin</a>")
            .unwrap();
        assert_eq!(output, "<p>intro</p><p>more</p>");
    }
}
