//! Render error types.
//!
//! Every variant is fatal for the current `render` call. Failures deeper in
//! the pipeline are wrapped together with the path of the document that
//! triggered them, so a caller can diagnose without re-running.

use crate::{compiler::CompileError, front_matter::FrontMatterError, template::ExpandError};
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors returned by [`Renderer::render`](crate::render::Renderer::render).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: `{path}`")]
    TemplateNotFound { path: PathBuf },

    #[error("layout `{layout}` not found (referenced by `{path}`)")]
    LayoutNotFound { layout: String, path: PathBuf },

    #[error("layout cycle detected: {}", display_chain(.chain))]
    LayoutCycle { chain: Vec<PathBuf> },

    #[error("`layout` in `{path}` must be a string")]
    InvalidLayout { path: PathBuf },

    #[error("IO error when reading `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid front matter in `{path}`")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("failed to compile `{path}`")]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("failed to expand `{path}`")]
    Expand {
        path: PathBuf,
        #[source]
        source: ExpandError,
    },
}

impl RenderError {
    /// Path of the document the error is about (last layout for cycles).
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::TemplateNotFound { path }
            | Self::LayoutNotFound { path, .. }
            | Self::InvalidLayout { path }
            | Self::Io { path, .. }
            | Self::FrontMatter { path, .. }
            | Self::Compile { path, .. }
            | Self::Expand { path, .. } => Some(path),
            Self::LayoutCycle { chain } => chain.last(),
        }
    }
}

/// `a.html -> b.html -> a.html`
fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_render_error_display() {
        let err = RenderError::LayoutNotFound {
            layout: "missing".into(),
            path: PathBuf::from("index.md"),
        };
        let display = err.to_string();
        assert!(display.contains("missing"));
        assert!(display.contains("index.md"));

        let err = RenderError::TemplateNotFound {
            path: PathBuf::from("nope"),
        };
        assert_eq!(err.to_string(), "template not found: `nope`");
    }

    #[test]
    fn test_layout_cycle_display() {
        let err = RenderError::LayoutCycle {
            chain: vec![
                PathBuf::from("_layouts/a.html"),
                PathBuf::from("_layouts/b.html"),
                PathBuf::from("_layouts/a.html"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "layout cycle detected: _layouts/a.html -> _layouts/b.html -> _layouts/a.html"
        );
        assert_eq!(err.path(), Some(&PathBuf::from("_layouts/a.html")));
    }

    #[test]
    fn test_source_is_preserved() {
        let err = RenderError::Io {
            path: PathBuf::from("page.md"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let source = err.source().expect("io source");
        assert!(source.to_string().contains("denied"));
    }
}
