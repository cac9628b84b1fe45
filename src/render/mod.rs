//! The render pipeline.
//!
//! ```text
//! render("posts/hello", vars)
//!   │
//!   ├─ resolve     posts/hello → posts/hello.md     (extension probing)
//!   ├─ parse       front matter + content
//!   ├─ merge       front matter < caller, body = placeholder
//!   ├─ compile     by extension (markdown, script, pass-through)
//!   ├─ expand      template engine over the merged scope
//!   │
//!   └─ layout?     _layouts/<name> rendered with the merged scope,
//!                  placeholder replaced by the body above; repeat
//! ```
//!
//! Every step is redone on each call; nothing is cached between renders.

pub mod scope;

pub use scope::{BODY_PLACEHOLDER, VariableScope, Variables};

use crate::{
    compiler::{CompileError, CompilerRegistry},
    config::QuireConfig,
    error::RenderError,
    front_matter,
    resource::{self, DiskResources, Resources},
    site::Site,
    template::{JinjaEngine, TemplateEngine},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Default layouts directory, relative to the resource root.
pub const DEFAULT_LAYOUTS: &str = "_layouts";

/// Default partials directory, relative to the resource root.
pub const DEFAULT_INCLUDES: &str = "_includes";

/// Renders documents with their layouts.
///
/// A `Renderer` is immutable once built and safe to share across threads;
/// script compilers serialize their own runtime access.
pub struct Renderer {
    resources: Arc<dyn Resources>,
    compilers: CompilerRegistry,
    engine: Box<dyn TemplateEngine>,
    extensions: Vec<String>,
    layouts: PathBuf,
    site: Site,
}

impl Renderer {
    /// Renderer over `resources` with the default compilers, extension list
    /// and directory names, and a MiniJinja engine loading partials from
    /// `_includes`.
    pub fn new(resources: Arc<dyn Resources>) -> Self {
        let extensions = resource::default_extensions();
        let engine = JinjaEngine::with_partials(
            Arc::clone(&resources),
            PathBuf::from(DEFAULT_INCLUDES),
            extensions.clone(),
        );
        Self {
            resources,
            compilers: CompilerRegistry::with_defaults(),
            engine: Box::new(engine),
            extensions,
            layouts: PathBuf::from(DEFAULT_LAYOUTS),
            site: Site::default(),
        }
    }

    /// Renderer for the site described by `config`.
    ///
    /// Documents, layouts and partials are read from `[build].root`; script
    /// programs are loaded here, so a broken script fails before any render.
    pub fn from_config(config: &QuireConfig) -> Result<Self, CompileError> {
        let build = &config.build;
        let resources: Arc<dyn Resources> = Arc::new(DiskResources::new(build.root.clone()));
        let engine = JinjaEngine::with_partials(
            Arc::clone(&resources),
            build.includes.clone(),
            build.extensions.clone(),
        );

        Ok(Self {
            resources,
            compilers: CompilerRegistry::from_config(&config.compilers, &build.root)?,
            engine: Box::new(engine),
            extensions: build.extensions.clone(),
            layouts: build.layouts.clone(),
            site: Site::new(config.site.clone()),
        })
    }

    pub fn with_compilers(mut self, compilers: CompilerRegistry) -> Self {
        self.compilers = compilers;
        self
    }

    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Replace the extension probing order used for documents and layouts.
    ///
    /// The engine installed by [`new`](Self::new) keeps its own list for
    /// partials; install a new engine to change that too.
    pub fn with_extensions<S: Into<String>>(
        mut self,
        extensions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_layouts(mut self, layouts: impl Into<PathBuf>) -> Self {
        self.layouts = layouts.into();
        self
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    pub fn compilers(&self) -> &CompilerRegistry {
        &self.compilers
    }

    /// Concrete file for a logical document path, if any.
    pub fn resolve(&self, logical_path: &str) -> Option<PathBuf> {
        resource::resolve(
            self.resources.as_ref(),
            Path::new(logical_path),
            &self.extensions,
        )
    }

    /// Render the document at `logical_path` and every layout it names.
    ///
    /// `variables` take precedence over the document's front matter. The
    /// whole chain either succeeds or returns the first error; partial
    /// output is never returned.
    pub fn render(&self, logical_path: &str, variables: &Variables) -> Result<String, RenderError> {
        let path = self
            .resolve(logical_path)
            .ok_or_else(|| RenderError::TemplateNotFound {
                path: PathBuf::from(logical_path),
            })?;

        let mut chain = vec![path.clone()];
        self.render_file(&path, &mut chain, variables)
    }

    /// Render the file at exactly `path`, without extension probing.
    pub fn render_path(&self, path: &Path, variables: &Variables) -> Result<String, RenderError> {
        let exact = resource::resolve(self.resources.as_ref(), path, &[String::new()])
            .ok_or_else(|| RenderError::TemplateNotFound {
                path: path.to_path_buf(),
            })?;

        let mut chain = vec![exact.clone()];
        self.render_file(&exact, &mut chain, variables)
    }

    /// Render `path`, then wrap it in its layout.
    ///
    /// `chain` holds every file from the document down to `path` and is used
    /// to detect cycles.
    fn render_file(
        &self,
        path: &Path,
        chain: &mut Vec<PathBuf>,
        caller: &Variables,
    ) -> Result<String, RenderError> {
        let text = self
            .resources
            .read_text(path)
            .map_err(|source| RenderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let document = front_matter::parse(&text).map_err(|source| RenderError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?;

        let scope = scope::merge(&document.variables, caller);

        let compiled = self
            .compilers
            .resolve(path)
            .compile(path, &document.content, &self.site)
            .map_err(|source| RenderError::Compile {
                path: path.to_path_buf(),
                source,
            })?;
        let body = self
            .engine
            .expand(&compiled, &self.site, &scope)
            .map_err(|source| RenderError::Expand {
                path: path.to_path_buf(),
                source,
            })?;

        let Some(layout) = document.layout() else {
            return Ok(body);
        };
        let name = layout
            .as_str()
            .ok_or_else(|| RenderError::InvalidLayout {
                path: path.to_path_buf(),
            })?;

        // Layout names always stay inside the layouts directory.
        let layout_path = resource::resolve(
            self.resources.as_ref(),
            &self.layouts.join(name.trim_start_matches('/')),
            &self.extensions,
        )
        .ok_or_else(|| RenderError::LayoutNotFound {
            layout: name.to_owned(),
            path: path.to_path_buf(),
        })?;

        if chain.contains(&layout_path) {
            chain.push(layout_path);
            return Err(RenderError::LayoutCycle {
                chain: std::mem::take(chain),
            });
        }

        chain.push(layout_path.clone());
        let wrapped = self.render_file(&layout_path, chain, scope.variables())?;
        Ok(wrapped.replace(BODY_PLACEHOLDER, &body))
    }
}
