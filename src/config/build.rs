//! `[build]` section configuration.
//!
//! Where documents, layouts and partials live, where `quire build` writes,
//! and the extension probing order.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in quire.toml.
///
/// # Example
/// ```toml
/// [build]
/// root = "site"            # Documents directory
/// layouts = "_layouts"     # Relative to root
/// includes = "_includes"   # Relative to root
/// output = "public"        # Relative to the project root
/// extensions = ["", ".html", ".md"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Documents directory; logical paths are resolved below it.
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: PathBuf,

    /// Layouts directory, relative to `root`.
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Partials directory for `{% include %}`, relative to `root`.
    #[serde(default = "defaults::build::includes")]
    #[educe(Default = defaults::build::includes())]
    pub includes: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Clear output directory before each build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Ordered extension probing list for documents, layouts and partials.
    #[serde(default = "defaults::build::extensions")]
    #[educe(Default = defaults::build::extensions())]
    pub extensions: Vec<String>,
}
