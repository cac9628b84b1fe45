//! MiniJinja-backed template engine.
//!
//! Supports the usual Jinja constructs: `{{ var }}`, `{% if %}`,
//! `{% for %}` and partials via `{% include "name" %}`. Partials are looked
//! up in the includes directory with the same extension probing as
//! documents, so `{% include "header" %}` finds `_includes/header.html`.

use super::{ExpandError, TemplateEngine};
use crate::{
    render::VariableScope,
    resource::{self, Resources},
    site::Site,
};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value, context};
use std::{path::PathBuf, sync::Arc};

/// Expands templates with a fresh environment per call.
///
/// MiniJinja caches templates returned by its loader, so the environment is
/// rebuilt on every [`expand`](TemplateEngine::expand); edited partials are
/// picked up by the next render.
#[derive(Default)]
pub struct JinjaEngine {
    partials: Option<Arc<Partials>>,
}

/// Where `{% include %}` names are looked up.
struct Partials {
    resources: Arc<dyn Resources>,
    includes: PathBuf,
    extensions: Vec<String>,
}

impl JinjaEngine {
    /// Engine without partial support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine resolving `{% include %}` names below `includes` in `resources`.
    pub fn with_partials(
        resources: Arc<dyn Resources>,
        includes: PathBuf,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            partials: Some(Arc::new(Partials {
                resources,
                includes,
                extensions,
            })),
        }
    }

    fn env(&self) -> Environment<'static> {
        let mut env = Environment::new();
        // Expansion must not eat the last newline of compiled output.
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        // Values are inserted verbatim, whatever the partial is named.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        if let Some(partials) = &self.partials {
            let partials = Arc::clone(partials);
            env.set_loader(move |name| partials.load(name));
        }
        env
    }
}

impl TemplateEngine for JinjaEngine {
    fn expand(
        &self,
        content: &str,
        site: &Site,
        scope: &VariableScope,
    ) -> Result<String, ExpandError> {
        // Explicit keys win over the spread, so `site` always names the site.
        let ctx = context! {
            site => Value::from_serialize(site.variables()),
            ..Value::from_serialize(scope)
        };
        Ok(self.env().render_str(content, ctx)?)
    }
}

impl Partials {
    fn load(&self, name: &str) -> Result<Option<String>, Error> {
        let logical = self.includes.join(name.trim_start_matches('/'));
        let resources = self.resources.as_ref();
        let Some(path) = resource::resolve(resources, &logical, &self.extensions) else {
            return Ok(None);
        };
        resources.read_text(&path).map(Some).map_err(|err| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to read partial `{}`", path.display()),
            )
            .with_source(err)
        })
    }
}
