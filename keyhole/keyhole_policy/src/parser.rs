//! Restriction expression parser.
//!
//! Accepts `policyName(args)` where `args` is a single quoted role, a
//! bracketed list of quoted roles, or nothing:
//!
//! ```
//! use keyhole_policy::parser::RestrictionParser;
//! use keyhole_policy::model::Policy;
//!
//! let restriction = RestrictionParser::parse("hasAllRoles(['A','B'])").unwrap();
//! assert_eq!(restriction.policy(), Policy::HasAllRoles);
//! assert_eq!(restriction.roles().len(), 2);
//! ```
//!
//! The same strict rules apply wherever an expression comes from, whether a
//! markup attribute or a route declaration.

use keyhole_core::error::PolicyError;
use keyhole_core::types::roles::RoleName;

use crate::model::{Policy, Restriction};

/// Parser for restriction expressions.
pub struct RestrictionParser;

impl RestrictionParser {
    /// Parse an expression into a typed restriction.
    ///
    /// # Errors
    ///
    /// * `PolicyError::Parse` - missing policy name, missing or unbalanced
    ///   parentheses or brackets, or trailing text.
    /// * `PolicyError::UnknownPolicy` - the name is well formed but is not
    ///   one of the known predicates.
    pub fn parse(expression: &str) -> Result<Restriction, PolicyError> {
        let trimmed = expression.trim();
        let malformed = |reason: &str| PolicyError::Parse {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let open = trimmed.find('(').ok_or_else(|| malformed("missing '('"))?;
        let name = trimmed[..open].trim();
        if name.is_empty() {
            return Err(malformed("missing policy name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed("policy name must be an identifier"));
        }
        let policy = Policy::from_name(name)
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))?;

        let rest = &trimmed[open + 1..];
        let args = rest
            .strip_suffix(')')
            .ok_or_else(|| malformed("unbalanced parentheses"))?;
        if args.contains(|c: char| c == '(' || c == ')') {
            return Err(malformed("unbalanced parentheses"));
        }

        let roles = Self::parse_arguments(args).map_err(malformed)?;
        Ok(Restriction::new(policy, roles))
    }

    /// Split the argument region into role names.
    fn parse_arguments(args: &str) -> Result<Vec<RoleName>, &'static str> {
        let args = args.trim();
        let opens = args.matches('[').count();
        let closes = args.matches(']').count();
        if opens != closes || opens > 1 {
            return Err("unbalanced brackets");
        }
        if opens == 1 && !(args.starts_with('[') && args.ends_with(']')) {
            return Err("role list must be enclosed in brackets");
        }

        let roles = args
            .split(',')
            .map(|token| {
                token
                    .chars()
                    .filter(|&c| !matches!(c, '[' | ']' | '\'' | '"') && !c.is_whitespace())
                    .collect::<String>()
            })
            .filter(|token| !token.is_empty())
            .map(RoleName::from)
            .collect();
        Ok(roles)
    }
}
