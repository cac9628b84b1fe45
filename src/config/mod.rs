//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section                 | Purpose                                   |
//! |-------------------------|-------------------------------------------|
//! | `[site]`                | Site-wide variables (`site.*` in templates) |
//! | `[build]`               | Directories and extension probing order   |
//! | `[compilers.markdown]`  | Built-in Markdown compiler                |
//! | `[[compilers.script]]`  | Lua-backed compilers                      |
//! | `[watch]`               | File watcher settings                     |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Docs"
//! author = { name = "Ada" }
//!
//! [build]
//! root = "site"
//! output = "public"
//!
//! [[compilers.script]]
//! name = "asciidoc"
//! extensions = ["adoc"]
//! program = "scripts/asciidoc.lua"
//! ```

mod build;
mod compilers;
pub mod defaults;
mod error;
mod watch;

pub use build::BuildConfig;
pub use compilers::{CompilersConfig, MarkdownConfig, ScriptConfig};
pub use error::ConfigError;
pub use watch::WatchConfig;

use crate::{
    cli::{Cli, Commands},
    render::Variables,
};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct QuireConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site-wide variables
    #[serde(default)]
    pub site: Variables,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Compiler settings
    #[serde(default)]
    pub compilers: CompilersConfig,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl QuireConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: QuireConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content).map_err(|err| err.in_file(path))?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Load `<root>/<config>` (defaults when the file is absent), apply the
    /// CLI and validate.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Resolve all paths against `root` and apply CLI overrides.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let root = Self::normalize_path(root);

        if let Commands::Build { output, clean } = &cli.command {
            Self::update_option(&mut self.build.output, output.as_ref());
            self.build.clean |= *clean;
        }

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every filesystem path absolute.
    ///
    /// `layouts` and `includes` stay relative: they are looked up below
    /// `build.root` through the renderer's resources.
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);

        self.build.root = Self::normalize_path(&root.join(&self.build.root));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        for script in &mut self.compilers.script {
            script.program = Self::normalize_path(&root.join(&script.program));
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    pub fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration after paths are resolved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.build.root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "[build.root] `{}` is not a directory",
                self.build.root.display()
            )));
        }

        if self.build.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "[build.extensions] must have at least one element".into(),
            ));
        }
        if let Some(ext) = self
            .build
            .extensions
            .iter()
            .find(|ext| !ext.is_empty() && !ext.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "[build.extensions] entry `{ext}` must be empty or start with `.`"
            )));
        }

        Self::check_relative("[build.layouts]", &self.build.layouts)?;
        Self::check_relative("[build.includes]", &self.build.includes)?;

        let mut claimed = FxHashSet::default();
        for script in &self.compilers.script {
            let field = format!("[compilers.script] `{}`", script.name);

            if script.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "[compilers.script] name must not be empty".into(),
                ));
            }
            if script.extensions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field} must have at least one extension"
                )));
            }
            for ext in &script.extensions {
                let ext = ext.trim_start_matches('.').to_ascii_lowercase();
                if !claimed.insert(ext.clone()) {
                    return Err(ConfigError::Validation(format!(
                        "{field}: extension `{ext}` is already claimed by another script"
                    )));
                }
            }
            if !script.program.is_file() {
                return Err(ConfigError::Validation(format!(
                    "{field}: program `{}` not found",
                    script.program.display()
                )));
            }
            for (key, name) in [("input", &script.input), ("output", &script.output)] {
                if !is_lua_identifier(name) {
                    return Err(ConfigError::Validation(format!(
                        "{field}: {key} `{name}` is not a valid Lua identifier"
                    )));
                }
            }
            if script.input == script.output {
                return Err(ConfigError::Validation(format!(
                    "{field}: input and output must differ"
                )));
            }
        }

        Ok(())
    }

    /// Reject absolute paths and `..` for directories resolved below the root.
    fn check_relative(field: &str, path: &Path) -> Result<(), ConfigError> {
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ConfigError::Validation(format!(
                "{field} must be a relative path inside [build.root]"
            )));
        }
        Ok(())
    }
}

/// `asciidocSource` yes, `2x` or `my-var` no.
fn is_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Tests
// ============================================================================
