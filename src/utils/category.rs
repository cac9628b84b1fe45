//! File category classification for watch mode.
//!
//! Decides what a changed file means for the documents being watched.
//!
//! # File Categories
//!
//! | Category   | Reaction                              | Example Files            |
//! |------------|---------------------------------------|--------------------------|
//! | Config     | Reload config, rebuild renderer       | `quire.toml`             |
//! | Script     | Reload script runtimes, re-render all | `scripts/asciidoc.lua`   |
//! | Layout     | Re-render all                         | `_layouts/*.html`        |
//! | Partial    | Re-render all                         | `_includes/*.html`       |
//! | Content    | Re-render documents resolving to it   | `posts/hello.md`         |
//! | Unknown    | Ignored                               | output dir, other files  |

use crate::config::QuireConfig;
use std::path::{Path, PathBuf};

/// Category of a changed file, used to determine the re-render strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Config,
    Script,
    Layout,
    Partial,
    Content,
    Unknown,
}

impl FileCategory {
    /// Whether a change can affect every watched document.
    pub const fn affects_all(self) -> bool {
        matches!(
            self,
            Self::Config | Self::Script | Self::Layout | Self::Partial
        )
    }
}

/// Categorize a file path to determine how changes should be handled.
///
/// Checked in order: config, scripts, output (ignored), layouts, includes,
/// then anything else below `[build].root`.
pub fn categorize_path(path: &Path, config: &QuireConfig) -> FileCategory {
    let path = QuireConfig::normalize_path(path);
    let root = &config.build.root;

    if path == config.config_path {
        FileCategory::Config
    } else if config.compilers.script.iter().any(|s| s.program == path) {
        FileCategory::Script
    } else if path.starts_with(&config.build.output) {
        FileCategory::Unknown
    } else if path.starts_with(root.join(&config.build.layouts)) {
        FileCategory::Layout
    } else if path.starts_with(root.join(&config.build.includes)) {
        FileCategory::Partial
    } else if path.starts_with(root) {
        FileCategory::Content
    } else {
        FileCategory::Unknown
    }
}

/// Paths to register with the watcher, with whether each is a directory.
///
/// The root covers layouts, includes and content; the config file and
/// script programs are added when they live outside it.
pub fn watch_targets(config: &QuireConfig) -> Vec<(PathBuf, bool)> {
    let root = &config.build.root;
    let mut targets = vec![(root.clone(), true)];

    let files = config
        .compilers
        .script
        .iter()
        .map(|s| &s.program)
        .chain([&config.config_path]);
    for file in files {
        if !file.starts_with(root) && file.exists() {
            targets.push((file.clone(), false));
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> QuireConfig {
        let mut config = QuireConfig::from_str(
            r#"
            [build]
            root = "site"

            [[compilers.script]]
            name = "adoc"
            extensions = ["adoc"]
            program = "scripts/adoc.lua"
        "#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("site/_layouts")).unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(dir.path().join("scripts/adoc.lua"), "").unwrap();
        fs::write(dir.path().join("quire.toml"), "").unwrap();

        config.config_path = QuireConfig::normalize_path(&dir.path().join("quire.toml"));
        config.build.output = PathBuf::from("site/public");
        config.update_path_with_root(dir.path());
        config
    }

    #[test]
    fn test_affects_all() {
        assert!(FileCategory::Config.affects_all());
        assert!(FileCategory::Script.affects_all());
        assert!(FileCategory::Partial.affects_all());
        assert!(!FileCategory::Content.affects_all());
        assert!(!FileCategory::Unknown.affects_all());
    }

    #[test]
    fn test_categorize_path() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let base = QuireConfig::normalize_path(dir.path());
        let category = |rel: &str| categorize_path(&base.join(rel), &config);

        assert_eq!(category("quire.toml"), FileCategory::Config);
        assert_eq!(category("scripts/adoc.lua"), FileCategory::Script);
        assert_eq!(category("site/_layouts/a.html"), FileCategory::Layout);
        assert_eq!(category("site/_includes/nav.html"), FileCategory::Partial);
        assert_eq!(category("site/posts/a.md"), FileCategory::Content);
        assert_eq!(category("site/public/a.html"), FileCategory::Unknown);
        assert_eq!(category("scripts/other.lua"), FileCategory::Unknown);
    }

    #[test]
    fn test_watch_targets() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let targets = watch_targets(&config);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], (config.build.root.clone(), true));
        assert!(targets.contains(&(config.config_path.clone(), false)));
        assert!(targets.contains(&(config.compilers.script[0].program.clone(), false)));
    }
}
