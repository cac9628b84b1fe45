//! Template expansion.
//!
//! Expansion is a capability consumed by the renderer: anything that can
//! substitute variables into text against a [`VariableScope`] can implement
//! [`TemplateEngine`]. The crate ships [`JinjaEngine`], backed by MiniJinja.

mod jinja;

pub use jinja::JinjaEngine;

use crate::{render::VariableScope, site::Site};

/// Error produced by a template engine.
pub type ExpandError = Box<dyn std::error::Error + Send + Sync>;

/// Expands variable references and control constructs in `content`.
///
/// References to undeclared variables resolve to an engine-defined default
/// (empty for [`JinjaEngine`]) instead of failing the render.
pub trait TemplateEngine: Send + Sync {
    fn expand(
        &self,
        content: &str,
        site: &Site,
        scope: &VariableScope,
    ) -> Result<String, ExpandError>;
}
