//! Format compilers.
//!
//! A [`Compiler`] turns the content of a document (front matter already
//! stripped) into output text before template expansion. Compilers are looked
//! up by file extension through the [`CompilerRegistry`]:
//!
//! | Extension            | Compiler            |
//! |----------------------|---------------------|
//! | `.md`, `.markdown`   | [`MarkdownCompiler`] (comrak)            |
//! | configured scripts   | [`ScriptCompiler`] (embedded Lua program) |
//! | anything else        | [`PassThrough`]                          |

mod markdown;
mod script;

pub use markdown::MarkdownCompiler;
pub use script::ScriptCompiler;

use crate::{config::CompilersConfig, site::Site};
use rustc_hash::FxHashMap;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

// ============================================================================
// Compiler Trait
// ============================================================================

/// Converts source text of one format into output text.
///
/// Implementations must be deterministic for identical input and must fail
/// as a whole rather than return partial output.
pub trait Compiler: Send + Sync {
    fn compile(&self, source: &Path, text: &str, site: &Site) -> Result<String, CompileError>;
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("script error: {0}")]
    Script(#[from] mlua::Error),

    #[error("script `{program}` produced no output (return a string or set `{variable}`)")]
    NoOutput { program: String, variable: String },

    #[error("IO error when reading script `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Identity compiler, used for every extension without a dedicated compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Compiler for PassThrough {
    fn compile(&self, _source: &Path, text: &str, _site: &Site) -> Result<String, CompileError> {
        Ok(text.to_owned())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Extension → compiler lookup.
pub struct CompilerRegistry {
    compilers: FxHashMap<String, Arc<dyn Compiler>>,
    scripts: Vec<Arc<ScriptCompiler>>,
    fallback: PassThrough,
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CompilerRegistry {
    /// Registry that passes everything through unchanged.
    pub fn empty() -> Self {
        Self {
            compilers: FxHashMap::default(),
            scripts: Vec::new(),
            fallback: PassThrough,
        }
    }

    /// Registry with the built-in Markdown compiler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(&["md", "markdown"], Arc::new(MarkdownCompiler::default()));
        registry
    }

    /// Build the registry described by `[compilers]`.
    ///
    /// Script programs are resolved against `root` and loaded immediately,
    /// so a broken script fails at startup rather than on first render.
    pub fn from_config(config: &CompilersConfig, root: &Path) -> Result<Self, CompileError> {
        let mut registry = Self::empty();

        if config.markdown.enable {
            let markdown = MarkdownCompiler::from_config(&config.markdown);
            registry.register(config.markdown.extensions.as_slice(), Arc::new(markdown));
        }

        for script in &config.script {
            let compiler = ScriptCompiler::load(
                &script.name,
                root.join(&script.program),
                &script.input,
                &script.output,
            )?;
            registry.register_script(script.extensions.as_slice(), compiler);
        }

        Ok(registry)
    }

    /// Map each of `extensions` (with or without leading dot) to `compiler`.
    pub fn register<S: AsRef<str>>(&mut self, extensions: &[S], compiler: Arc<dyn Compiler>) {
        for ext in extensions {
            self.compilers
                .insert(normalize_extension(ext.as_ref()), Arc::clone(&compiler));
        }
    }

    /// Register a script compiler; it is also tracked for [`reload_scripts`](Self::reload_scripts).
    pub fn register_script<S: AsRef<str>>(&mut self, extensions: &[S], compiler: ScriptCompiler) {
        let compiler = Arc::new(compiler);
        self.register(extensions, Arc::clone(&compiler) as Arc<dyn Compiler>);
        self.scripts.push(compiler);
    }

    /// Compiler for `file_name`, dispatched on its extension.
    pub fn resolve(&self, file_name: &Path) -> &dyn Compiler {
        file_name
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.compilers.get(&normalize_extension(ext)))
            .map_or(&self.fallback as &dyn Compiler, |compiler| {
                compiler.as_ref()
            })
    }

    /// Re-read every script program from disk.
    pub fn reload_scripts(&self) -> Result<(), CompileError> {
        self.scripts.iter().try_for_each(|script| script.reload())
    }
}

/// `.MD` → `md`
fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl Compiler for Shout {
        fn compile(&self, _: &Path, text: &str, _: &Site) -> Result<String, CompileError> {
            Ok(text.to_uppercase())
        }
    }

    fn compile_with(registry: &CompilerRegistry, file: &str, text: &str) -> String {
        registry
            .resolve(Path::new(file))
            .compile(Path::new(file), text, &Site::default())
            .unwrap()
    }

    #[test]
    fn test_passthrough() {
        let out = PassThrough
            .compile(Path::new("a.txt"), "{{ x }}", &Site::default())
            .unwrap();
        assert_eq!(out, "{{ x }}");
    }

    #[test]
    fn test_unknown_extension_passes_through() {
        let registry = CompilerRegistry::with_defaults();
        assert_eq!(compile_with(&registry, "page.html", "<b>x</b>"), "<b>x</b>");
        assert_eq!(compile_with(&registry, "README", "# x"), "# x");
    }

    #[test]
    fn test_markdown_by_default() {
        let registry = CompilerRegistry::with_defaults();
        assert_eq!(compile_with(&registry, "page.md", "# Hi"), "<h1>Hi</h1>\n");
        assert_eq!(
            compile_with(&registry, "page.markdown", "# Hi"),
            "<h1>Hi</h1>\n"
        );
    }

    #[test]
    fn test_register_normalizes_extension() {
        let mut registry = CompilerRegistry::empty();
        registry.register(&[".Shout"], Arc::new(Shout));
        assert_eq!(compile_with(&registry, "a.shout", "hey"), "HEY");
        assert_eq!(compile_with(&registry, "a.SHOUT", "hey"), "HEY");
        assert_eq!(compile_with(&registry, "a.md", "hey"), "hey");
    }

    #[test]
    fn test_register_overrides() {
        let mut registry = CompilerRegistry::with_defaults();
        registry.register(&["md"], Arc::new(Shout));
        assert_eq!(compile_with(&registry, "a.md", "# hi"), "# HI");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".MD"), "md");
        assert_eq!(normalize_extension("adoc"), "adoc");
    }
}
