//! # Keyhole DOM
//!
//! `keyhole_dom` secures rendered markup. Elements annotated with a
//! restriction attribute are evaluated against the session and, when
//! denied, removed or disabled:
//!
//! ```html
//! <button data-secure="hasRole('ADMIN')" data-secure-action="disable">Delete</button>
//! ```
//!
//! ## Crate Structure
//!
//! - **node**: The fragment model (elements, text, comments)
//! - **markup**: Parsing and serializing markup
//! - **action**: Remediation actions
//! - **enforcer**: The enforcement walk
//! - **render**: Template rendering with enforcement

pub mod action;
pub mod enforcer;
pub mod markup;
pub mod node;
pub mod render;

pub use action::RemediationAction;
pub use enforcer::{DomEnforcer, EnforcementReport, SkippedNode};
pub use node::{Attribute, Document, Element, Fragment, Node};
pub use render::{MarkupTemplate, Renderer, Template, TemplateCache};
