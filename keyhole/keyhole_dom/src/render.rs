//! Template rendering with restriction enforcement.
//!
//! A `Renderer` produces markup from a template and, when it has an
//! enforcer, secures the result before handing it back. Without an
//! enforcer rendering output is returned unchanged.

use keyhole_core::error::{DomError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::enforcer::DomEnforcer;

/// Something that turns data into markup.
pub trait Template: Send + Sync {
    /// Render the template against `data`.
    fn render(&self, data: &Value) -> Result<String>;
}

impl<F> Template for F
where
    F: Fn(&Value) -> Result<String> + Send + Sync,
{
    fn render(&self, data: &Value) -> Result<String> {
        self(data)
    }
}

/// Markup with `{{key}}` placeholders filled from the top-level fields of
/// the data object. Values are HTML-escaped; missing keys render as nothing.
#[derive(Debug, Clone)]
pub struct MarkupTemplate {
    source: String,
}

impl MarkupTemplate {
    /// Create a template from its source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Template for MarkupTemplate {
    fn render(&self, data: &Value) -> Result<String> {
        let mut output = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                output.push_str(&rest[start..]);
                return Ok(output);
            };
            match data.get(after[..end].trim()) {
                Some(Value::String(s)) => push_escaped(&mut output, s),
                Some(Value::Null) | None => {}
                Some(other) => push_escaped(&mut output, &other.to_string()),
            }
            rest = &after[end + 2..];
        }
        output.push_str(rest);
        Ok(output)
    }
}

fn push_escaped(output: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
}

/// Named templates.
#[derive(Default)]
pub struct TemplateCache {
    templates: RwLock<HashMap<String, Arc<dyn Template>>>,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any with the same name.
    pub fn insert(&self, name: impl Into<String>, template: impl Template + 'static) {
        self.templates.write().insert(name.into(), Arc::new(template));
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Template>> {
        self.templates.read().get(name).cloned()
    }

    /// Remove a template, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.templates.write().remove(name).is_some()
    }

    /// Whether a template is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.read().contains_key(name)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders templates, enforcing restrictions on the output.
#[derive(Clone, Default)]
pub struct Renderer {
    cache: Arc<TemplateCache>,
    enforcer: Option<DomEnforcer>,
}

impl Renderer {
    /// A renderer with an empty cache and no enforcement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce restrictions on every rendered fragment.
    pub fn with_enforcer(mut self, enforcer: DomEnforcer) -> Self {
        self.enforcer = Some(enforcer);
        self
    }

    /// Share an existing template cache.
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The template cache.
    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    /// Render `template` against `data`.
    pub fn render(&self, template: &dyn Template, data: &Value) -> Result<String> {
        let markup = template.render(data)?;
        match &self.enforcer {
            Some(enforcer) => enforcer.enforce_markup(&markup),
            None => Ok(markup),
        }
    }

    /// Render the cached template called `name`.
    ///
    /// # Errors
    ///
    /// `DomError::TemplateNotFound` if no such template is cached.
    pub fn render_named(&self, name: &str, data: &Value) -> Result<String> {
        let template = self
            .cache
            .get(name)
            .ok_or_else(|| DomError::TemplateNotFound(name.to_string()))?;
        debug!(template = name, enforced = self.enforcer.is_some(), "Rendering template");
        self.render(template.as_ref(), data)
    }
}
