//! Remediation actions applied to denied nodes.

use keyhole_core::error::DomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happens to a protected node when its restriction is denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationAction {
    /// Detach the node and its subtree.
    #[default]
    Remove,

    /// Keep the node but mark it disabled.
    Disable,
}

impl RemediationAction {
    /// The attribute spelling of this action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Disable => "disable",
        }
    }
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RemediationAction {
    type Err = DomError;

    /// Parse an action attribute value. An empty value means `remove`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("remove") {
            Ok(Self::Remove)
        } else if name.eq_ignore_ascii_case("disable") {
            Ok(Self::Disable)
        } else {
            Err(DomError::UnknownAction(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("remove".parse::<RemediationAction>().unwrap(), RemediationAction::Remove);
        assert_eq!(" Disable ".parse::<RemediationAction>().unwrap(), RemediationAction::Disable);
        assert_eq!("".parse::<RemediationAction>().unwrap(), RemediationAction::Remove);
        assert_eq!(RemediationAction::default(), RemediationAction::Remove);
    }

    #[test]
    fn test_unknown_action() {
        let err = "hide".parse::<RemediationAction>().unwrap_err();
        assert!(matches!(err, DomError::UnknownAction(ref name) if name == "hide"));
    }
}
