//! Credentials and authentication state.

use keyhole_core::types::roles::{RoleName, RoleSet};
use serde::{Deserialize, Serialize};

/// What a successful login supplies: who the principal is and what roles it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The principal's identity.
    pub principal: String,

    /// The roles granted to the principal.
    #[serde(default)]
    pub roles: RoleSet,
}

impl Credential {
    /// Create a credential.
    pub fn new<I, R>(principal: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self {
            principal: principal.into(),
            roles: roles.into_iter().collect(),
        }
    }
}

/// Authentication state of a session.
///
/// A principal and its roles exist exactly when the session is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// No principal is logged in.
    #[default]
    Anonymous,

    /// A principal is logged in.
    Authenticated {
        /// The principal's identity.
        principal: String,

        /// The roles the principal holds.
        roles: RoleSet,
    },
}

impl AuthState {
    /// Whether a principal is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The logged-in principal, if any.
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::Authenticated { principal, .. } => Some(principal),
            Self::Anonymous => None,
        }
    }

    /// The roles held, if authenticated.
    pub fn roles(&self) -> Option<&RoleSet> {
        match self {
            Self::Authenticated { roles, .. } => Some(roles),
            Self::Anonymous => None,
        }
    }
}

impl From<Credential> for AuthState {
    fn from(credential: Credential) -> Self {
        Self::Authenticated {
            principal: credential.principal,
            roles: credential.roles,
        }
    }
}
