//! Role names, role sets and the role-set predicates.
//!
//! The predicates are pure: they compare the roles a principal holds against
//! a collection of candidate roles. An absent held-role collection behaves
//! exactly like an empty one.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// An opaque role label, e.g. `ADMIN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Create a role name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The role name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RoleName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&String> for RoleName {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}

/// An unordered collection of role names. Duplicates collapse on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet {
    roles: BTreeSet<RoleName>,
}

impl RoleSet {
    /// Create an empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role. Returns `false` if it was already present.
    pub fn insert(&mut self, role: impl Into<RoleName>) -> bool {
        self.roles.insert(role.into())
    }

    /// Whether the set holds `role`.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Number of distinct roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Iterate over the roles in lexical order.
    pub fn iter(&self) -> btree_set::Iter<'_, RoleName> {
        self.roles.iter()
    }

    /// Roles present in both sets.
    pub fn intersection(&self, other: &RoleSet) -> RoleSet {
        self.roles.intersection(&other.roles).cloned().collect()
    }
}

impl<R: Into<RoleName>> FromIterator<R> for RoleSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a RoleName;
    type IntoIter = btree_set::Iter<'a, RoleName>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, role) in self.roles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", role)?;
        }
        write!(f, "]")
    }
}

/// A zero-argument role provider, for role lists computed at check time.
pub type RoleProvider = Arc<dyn Fn() -> Vec<RoleName> + Send + Sync>;

/// The candidate side of a predicate.
///
/// A scalar role becomes a one-element list; a provider is invoked each time
/// the candidates are resolved.
#[derive(Clone)]
pub enum Candidates {
    /// A fixed list of roles.
    Static(Vec<RoleName>),

    /// Roles produced on demand.
    Dynamic(RoleProvider),
}

impl Candidates {
    /// Wrap a provider closure.
    pub fn provider<F>(f: F) -> Self
    where
        F: Fn() -> Vec<RoleName> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Normalize into a set, invoking the provider if there is one.
    pub fn resolve(&self) -> RoleSet {
        match self {
            Self::Static(roles) => roles.iter().cloned().collect(),
            Self::Dynamic(provider) => provider().into_iter().collect(),
        }
    }
}

impl fmt::Debug for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(roles) => f.debug_tuple("Static").field(roles).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Candidates {
    fn from(role: &str) -> Self {
        Self::Static(vec![RoleName::from(role)])
    }
}

impl From<String> for Candidates {
    fn from(role: String) -> Self {
        Self::Static(vec![RoleName::from(role)])
    }
}

impl From<RoleName> for Candidates {
    fn from(role: RoleName) -> Self {
        Self::Static(vec![role])
    }
}

impl<R: Into<RoleName>> From<Vec<R>> for Candidates {
    fn from(roles: Vec<R>) -> Self {
        Self::Static(roles.into_iter().map(Into::into).collect())
    }
}

impl<R: Into<RoleName>, const N: usize> From<[R; N]> for Candidates {
    fn from(roles: [R; N]) -> Self {
        Self::Static(roles.into_iter().map(Into::into).collect())
    }
}

impl<R: Clone + Into<RoleName>> From<&[R]> for Candidates {
    fn from(roles: &[R]) -> Self {
        Self::Static(roles.iter().cloned().map(Into::into).collect())
    }
}

impl From<&RoleSet> for Candidates {
    fn from(roles: &RoleSet) -> Self {
        Self::Static(roles.iter().cloned().collect())
    }
}

fn held_intersection(held: Option<&RoleSet>, candidates: &RoleSet) -> RoleSet {
    match held {
        Some(held) => held.intersection(candidates),
        None => RoleSet::new(),
    }
}

/// True iff the principal holds at least one candidate role.
///
/// ```
/// use keyhole_core::types::roles::{has_role, RoleSet};
///
/// let held: RoleSet = ["ADMIN"].into_iter().collect();
/// assert!(has_role(Some(&held), "ADMIN"));
/// assert!(has_role(Some(&held), ["EDITOR", "ADMIN"]));
/// assert!(!has_role(None, "ADMIN"));
/// ```
pub fn has_role(held: Option<&RoleSet>, candidates: impl Into<Candidates>) -> bool {
    let candidates = candidates.into().resolve();
    !held_intersection(held, &candidates).is_empty()
}

/// Alias of [`has_role`].
pub fn has_any_role(held: Option<&RoleSet>, candidates: impl Into<Candidates>) -> bool {
    has_role(held, candidates)
}

/// True iff the principal holds every candidate role.
pub fn has_all_roles(held: Option<&RoleSet>, candidates: impl Into<Candidates>) -> bool {
    let candidates = candidates.into().resolve();
    held_intersection(held, &candidates).len() == candidates.len()
}

/// True iff the principal holds none of the candidate roles.
pub fn has_no_roles(held: Option<&RoleSet>, candidates: impl Into<Candidates>) -> bool {
    let candidates = candidates.into().resolve();
    held_intersection(held, &candidates).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_role_set_ignores_duplicates() {
        let set = roles(&["ADMIN", "ADMIN", "EDITOR"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "[ADMIN, EDITOR]");
    }

    #[test]
    fn test_has_all_roles() {
        let held = roles(&["ADMIN"]);
        assert!(!has_all_roles(Some(&held), ["ADMIN", "EDITOR"]));

        let held = roles(&["ADMIN", "EDITOR"]);
        assert!(has_all_roles(Some(&held), ["ADMIN", "EDITOR"]));
        assert!(has_all_roles(Some(&held), vec!["EDITOR", "EDITOR"]));
    }

    #[test]
    fn test_has_no_roles() {
        let held = roles(&["VIEWER"]);
        assert!(has_no_roles(Some(&held), ["ADMIN"]));
        assert!(!has_no_roles(Some(&held), ["ADMIN", "VIEWER"]));
        assert!(has_no_roles(None, "ADMIN"));
    }

    #[test]
    fn test_absent_roles_behave_as_empty() {
        assert!(!has_role(None, "ADMIN"));
        assert!(!has_any_role(None, ["ADMIN", "EDITOR"]));
        assert!(!has_all_roles(None, "ADMIN"));
        assert!(has_all_roles(None, Vec::<String>::new()));
    }

    #[test]
    fn test_dynamic_candidates_invoked_per_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let candidates = Candidates::provider(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![RoleName::from("EDITOR")]
        });

        let held = roles(&["EDITOR"]);
        assert!(has_role(Some(&held), candidates.clone()));
        assert!(!has_no_roles(Some(&held), candidates));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
