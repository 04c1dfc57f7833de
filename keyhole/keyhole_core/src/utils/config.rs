//! Secure-markup configuration.
//!
//! `SecureConfig` is the effective configuration held by a session.
//! `SecureOptions` is a partial overlay merged into it; keys it does not
//! know are ignored rather than rejected.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Attributes owned by the form-validation layer. Secure tags may not reuse them.
pub const RESERVED_ATTRIBUTES: &[&str] =
    &["data-error-style", "data-tooltip", "data-tooltip-position"];

/// Effective configuration for restriction annotations and route fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureConfig {
    /// Attribute holding the restriction expression.
    pub secure_tag: String,

    /// Attribute naming the remediation action.
    pub secure_action_tag: String,

    /// Attribute set on nodes remediated with `disable`.
    pub disabled_attribute: String,

    /// Where the not-authorized route handler redirects.
    pub not_authorized_location: String,
}

impl Default for SecureConfig {
    fn default() -> Self {
        Self {
            secure_tag: "data-secure".to_string(),
            secure_action_tag: "data-secure-action".to_string(),
            disabled_attribute: "disabled".to_string(),
            not_authorized_location: "/401.html".to_string(),
        }
    }
}

impl SecureConfig {
    /// Return a copy with `options` applied on top.
    ///
    /// Nothing is applied unless the merged result is valid.
    pub fn merged(&self, options: &SecureOptions) -> Result<Self, ConfigError> {
        let mut merged = self.clone();
        if let Some(tag) = &options.secure_tag {
            merged.secure_tag = tag.trim().to_string();
        }
        if let Some(tag) = &options.secure_action_tag {
            merged.secure_action_tag = tag.trim().to_string();
        }
        if let Some(attr) = &options.disabled_attribute {
            merged.disabled_attribute = attr.trim().to_string();
        }
        if let Some(location) = &options.not_authorized_location {
            merged.not_authorized_location = location.trim().to_string();
        }
        merged.validate()?;
        Ok(merged)
    }

    /// Check the attribute names are usable and do not collide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("secure_tag", &self.secure_tag),
            ("secure_action_tag", &self.secure_action_tag),
            ("disabled_attribute", &self.disabled_attribute),
        ] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-empty attribute name, got '{}'",
                    name, value
                )));
            }
            if RESERVED_ATTRIBUTES.contains(&value.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "{} '{}' is reserved for validation messages",
                    name, value
                )));
            }
        }
        if self.secure_tag == self.secure_action_tag {
            return Err(ConfigError::Invalid(format!(
                "secure_tag and secure_action_tag are both '{}'",
                self.secure_tag
            )));
        }
        if self.not_authorized_location.is_empty() {
            return Err(ConfigError::Invalid(
                "not_authorized_location must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial configuration overlay. Unknown keys are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureOptions {
    /// Override for [`SecureConfig::secure_tag`].
    #[serde(alias = "secureTag")]
    pub secure_tag: Option<String>,

    /// Override for [`SecureConfig::secure_action_tag`].
    #[serde(alias = "secureActionTag")]
    pub secure_action_tag: Option<String>,

    /// Override for [`SecureConfig::disabled_attribute`].
    pub disabled_attribute: Option<String>,

    /// Override for [`SecureConfig::not_authorized_location`].
    pub not_authorized_location: Option<String>,
}

impl SecureOptions {
    /// Read options from a loose JSON object, ignoring unrecognized keys.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::ParseFailed(format!(
                "options must be an object, got {}",
                value
            )));
        }
        serde_json::from_value(value).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Set the restriction attribute.
    pub fn with_secure_tag(mut self, tag: impl Into<String>) -> Self {
        self.secure_tag = Some(tag.into());
        self
    }

    /// Set the action attribute.
    pub fn with_secure_action_tag(mut self, tag: impl Into<String>) -> Self {
        self.secure_action_tag = Some(tag.into());
        self
    }

    /// Set the not-authorized redirect location.
    pub fn with_not_authorized_location(mut self, location: impl Into<String>) -> Self {
        self.not_authorized_location = Some(location.into());
        self
    }
}
