//! Restriction model.
//!
//! A restriction pairs a policy predicate with the role names it is checked
//! against. It renders to, and parses from, the expression form used in
//! markup attributes and route declarations, e.g. `hasAllRoles(['A','B'])`.

use keyhole_core::error::PolicyError;
use keyhole_core::types::roles::{self, Candidates, RoleName, RoleSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::parser::RestrictionParser;

/// The role-set predicate a restriction applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// At least one of the roles is held.
    HasRole,

    /// Same contract as `HasRole`.
    HasAnyRole,

    /// Every role is held.
    HasAllRoles,

    /// None of the roles is held.
    HasNoRoles,
}

impl Policy {
    /// Every known policy.
    pub const ALL: [Policy; 4] = [
        Policy::HasRole,
        Policy::HasAnyRole,
        Policy::HasAllRoles,
        Policy::HasNoRoles,
    ];

    /// The name used in restriction expressions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HasRole => "hasRole",
            Self::HasAnyRole => "hasAnyRole",
            Self::HasAllRoles => "hasAllRoles",
            Self::HasNoRoles => "hasNoRoles",
        }
    }

    /// Resolve an expression name to a policy.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|policy| policy.name() == name)
    }

    /// Apply the predicate to the held roles.
    pub fn check(&self, held: Option<&RoleSet>, candidates: impl Into<Candidates>) -> bool {
        match self {
            Self::HasRole => roles::has_role(held, candidates),
            Self::HasAnyRole => roles::has_any_role(held, candidates),
            Self::HasAllRoles => roles::has_all_roles(held, candidates),
            Self::HasNoRoles => roles::has_no_roles(held, candidates),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PolicyError::UnknownPolicy(s.to_string()))
    }
}

/// A parsed restriction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Restriction {
    policy: Policy,
    roles: Vec<RoleName>,
}

impl Restriction {
    /// Create a restriction from a policy and its role arguments.
    pub fn new<I, R>(policy: Policy, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self {
            policy,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// `hasRole('role')`
    pub fn has_role(role: impl Into<RoleName>) -> Self {
        Self::new(Policy::HasRole, [role.into()])
    }

    /// `hasAnyRole([...])`
    pub fn has_any_role<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self::new(Policy::HasAnyRole, roles)
    }

    /// `hasAllRoles([...])`
    pub fn has_all_roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self::new(Policy::HasAllRoles, roles)
    }

    /// `hasNoRoles([...])`
    pub fn has_no_roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self::new(Policy::HasNoRoles, roles)
    }

    /// The predicate this restriction applies.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The role arguments, in declaration order.
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    /// Check the restriction against a held role set.
    ///
    /// This does not consider authentication; see `PolicyEvaluator`.
    pub fn check(&self, held: Option<&RoleSet>) -> bool {
        self.policy.check(held, self.roles.as_slice())
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.policy)?;
        match self.roles.as_slice() {
            [] => {}
            [role] => write!(f, "'{}'", role)?,
            roles => {
                write!(f, "[")?;
                for (i, role) in roles.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "'{}'", role)?;
                }
                write!(f, "]")?;
            }
        }
        write!(f, ")")
    }
}

impl FromStr for Restriction {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RestrictionParser::parse(s)
    }
}

impl Serialize for Restriction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Restriction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let expression = String::deserialize(deserializer)?;
        expression.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names_round_trip() {
        for policy in Policy::ALL {
            assert_eq!(Policy::from_name(policy.name()), Some(policy));
        }
        assert_eq!(Policy::from_name("hasRoles"), None);
    }

    #[test]
    fn test_display_canonical_form() {
        assert_eq!(Restriction::has_role("ADMIN").to_string(), "hasRole('ADMIN')");
        assert_eq!(
            Restriction::has_all_roles(["ADMIN", "EDITOR"]).to_string(),
            "hasAllRoles(['ADMIN','EDITOR'])"
        );
        assert_eq!(
            Restriction::has_no_roles(Vec::<String>::new()).to_string(),
            "hasNoRoles()"
        );
    }

    #[test]
    fn test_check_ignores_authentication() {
        let held: RoleSet = ["ADMIN"].into_iter().collect();
        assert!(Restriction::has_role("ADMIN").check(Some(&held)));
        assert!(!Restriction::has_all_roles(["ADMIN", "EDITOR"]).check(Some(&held)));
        assert!(Restriction::has_no_roles(["EDITOR"]).check(None));
    }

    #[test]
    fn test_serde_uses_expression_form() {
        let restriction = Restriction::has_any_role(["A", "B"]);
        let json = serde_json::to_string(&restriction).unwrap();
        assert_eq!(json, "\"hasAnyRole(['A','B'])\"");

        let parsed: Restriction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, restriction);

        assert!(serde_json::from_str::<Restriction>("\"isAdmin('A')\"").is_err());
    }
}
