//! Authorization decision model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of evaluating one restriction for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The principal the restriction was evaluated for; `None` when anonymous.
    pub principal: Option<String>,

    /// The restriction in expression form.
    pub restriction: String,

    /// Whether access was granted.
    pub granted: bool,

    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// Create a decision stamped with the current time.
    pub fn new(principal: Option<String>, restriction: impl Into<String>, granted: bool) -> Self {
        Self {
            principal,
            restriction: restriction.into(),
            granted,
            decided_at: Utc::now(),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} for {}",
            if self.granted { "granted" } else { "denied" },
            self.restriction,
            self.principal.as_deref().unwrap_or("<anonymous>")
        )
    }
}
