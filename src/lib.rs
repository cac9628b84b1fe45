//! Quire: a document rendering pipeline.
//!
//! A document is a text file with optional YAML front matter. Rendering one
//! compiles its content by extension (Markdown, an embedded Lua program or
//! pass-through), expands it as a MiniJinja template over the merged
//! variables, and wraps it in the layouts it names, recursively.
//!
//! ```ignore
//! use quire::{render::{Renderer, Variables}, resource::DiskResources};
//! use std::sync::Arc;
//!
//! let renderer = Renderer::new(Arc::new(DiskResources::new("site")));
//! let html = renderer.render("posts/hello", &Variables::new())?;
//! ```

pub mod build;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod front_matter;
pub mod logger;
pub mod render;
pub mod resource;
pub mod site;
pub mod template;
pub mod utils;
pub mod watch;

pub use error::RenderError;
pub use render::{Renderer, Variables};
pub use site::Site;
