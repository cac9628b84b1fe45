//! `[compilers]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[compilers]` section in quire.toml.
///
/// # Example
/// ```toml
/// [compilers.markdown]
/// smart = true
///
/// [[compilers.script]]
/// name = "asciidoc"
/// extensions = ["adoc", "asciidoc"]
/// program = "scripts/asciidoc.lua"
/// input = "asciidocSource"
/// output = "html"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilersConfig {
    /// Built-in Markdown compiler.
    pub markdown: MarkdownConfig,

    /// Embedded Lua conversion programs.
    pub script: Vec<ScriptConfig>,
}

/// `[compilers.markdown]`: comrak options.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Register the Markdown compiler at all.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// GitHub Flavored Markdown extensions (tables, strikethrough,
    /// autolinks, task lists, footnotes).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub gfm: bool,

    /// Typographic quotes and dashes.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub smart: bool,

    /// Pass raw HTML through instead of dropping it.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub unsafe_html: bool,

    /// Extensions routed to the Markdown compiler.
    #[serde(default = "defaults::compilers::markdown::extensions")]
    #[educe(Default = defaults::compilers::markdown::extensions())]
    pub extensions: Vec<String>,
}

/// One `[[compilers.script]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptConfig {
    /// Name used in error messages.
    pub name: String,

    /// Extensions routed to this compiler.
    pub extensions: Vec<String>,

    /// Lua program, relative to the project root.
    pub program: PathBuf,

    /// Global the source text is bound to.
    #[serde(default = "defaults::compilers::script::input")]
    pub input: String,

    /// Global read when the program returns nothing.
    #[serde(default = "defaults::compilers::script::output")]
    pub output: String,
}
