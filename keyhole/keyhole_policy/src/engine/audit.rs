//! Policy auditing.
//!
//! Keeps a bounded history of authorization decisions per principal.

use dashmap::DashMap;
use std::sync::Arc;

use crate::model::Decision;

/// A bounded log of authorization decisions, keyed by principal.
///
/// Anonymous decisions are kept under the `None` key.
#[derive(Clone)]
pub struct PolicyAudit {
    /// The audit entries.
    entries: Arc<DashMap<Option<String>, Vec<Decision>>>,

    /// The maximum number of entries to keep per principal.
    max_entries_per_principal: usize,
}

impl PolicyAudit {
    /// Create an audit keeping at most `max_entries_per_principal` decisions
    /// for each principal.
    pub fn new(max_entries_per_principal: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_principal,
        }
    }

    /// Record a decision, dropping the oldest entries beyond capacity.
    pub fn record(&self, decision: Decision) {
        let mut entries = self.entries.entry(decision.principal.clone()).or_default();
        entries.push(decision);
        if entries.len() > self.max_entries_per_principal {
            let to_remove = entries.len() - self.max_entries_per_principal;
            entries.drain(0..to_remove);
        }
    }

    /// Decisions for one principal, oldest first.
    pub fn decisions_for(&self, principal: Option<&str>) -> Vec<Decision> {
        self.entries
            .get(&principal.map(str::to_string))
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Every recorded decision.
    pub fn all_decisions(&self) -> Vec<Decision> {
        let mut decisions: Vec<Decision> = self
            .entries
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        decisions.sort_by_key(|decision| decision.decided_at);
        decisions
    }

    /// Every recorded decision with the given outcome.
    pub fn decisions_by_outcome(&self, granted: bool) -> Vec<Decision> {
        self.all_decisions()
            .into_iter()
            .filter(|decision| decision.granted == granted)
            .collect()
    }

    /// Forget the decisions for one principal.
    pub fn clear(&self, principal: Option<&str>) {
        self.entries.remove(&principal.map(str::to_string));
    }
}

impl Default for PolicyAudit {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get_decisions() {
        let audit = PolicyAudit::new(10);
        audit.record(Decision::new(Some("alice".into()), "hasRole('A')", true));
        audit.record(Decision::new(None, "hasRole('A')", false));

        assert_eq!(audit.decisions_for(Some("alice")).len(), 1);
        assert_eq!(audit.decisions_for(None).len(), 1);
        assert_eq!(audit.all_decisions().len(), 2);
        assert_eq!(audit.decisions_by_outcome(false).len(), 1);
    }

    #[test]
    fn test_trims_to_capacity() {
        let audit = PolicyAudit::new(3);
        for i in 0..5 {
            audit.record(Decision::new(Some("bob".into()), format!("hasRole('R{}')", i), true));
        }

        let decisions = audit.decisions_for(Some("bob"));
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0].restriction, "hasRole('R2')");
        assert_eq!(decisions[2].restriction, "hasRole('R4')");
    }

    #[test]
    fn test_clear() {
        let audit = PolicyAudit::default();
        audit.record(Decision::new(Some("carol".into()), "hasRole('A')", true));
        audit.clear(Some("carol"));
        assert!(audit.decisions_for(Some("carol")).is_empty());
    }
}
