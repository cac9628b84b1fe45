//! Filesystem capability for document, layout and partial lookup.
//!
//! The render pipeline only needs two operations, `exists` and `read_text`,
//! on paths relative to some root. [`DiskResources`] serves them from a
//! directory, [`MemoryResources`] from a map (handy for tests and for
//! embedding a fixed set of templates).
//!
//! # Resolution
//!
//! A logical path such as `posts/hello` names a document without its
//! extension. [`resolve`] appends each configured extension in order and
//! returns the first candidate that exists:
//!
//! ```text
//! posts/hello + ""          -> posts/hello          (missing)
//! posts/hello + ".html"     -> posts/hello.html     (missing)
//! posts/hello + ".md"       -> posts/hello.md       (found, wins)
//! posts/hello + ".markdown" -> (not probed)
//! ```

use rustc_hash::FxHashMap;
use std::{
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Default extension probing order.
///
/// The empty extension comes first so callers may also name a file exactly
/// (`layout: default.html`).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "",
    ".html",
    ".md",
    ".markdown",
    ".txt",
    ".asciidoc",
    ".adoc",
];

/// Read-only access to template sources.
pub trait Resources: Send + Sync {
    /// Whether `path` names an existing, readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Read `path` as UTF-8 text.
    fn read_text(&self, path: &Path) -> io::Result<String>;
}

// ============================================================================
// Disk
// ============================================================================

/// Resources served from a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskResources {
    root: PathBuf,
}

impl DiskResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Resources for DiskResources {
    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.root.join(path))
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Resources held in memory, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    files: FxHashMap<PathBuf, String>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl Resources for MemoryResources {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such resource: {}", path.display()),
            )
        })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a logical path to an existing resource by probing `extensions` in
/// order. Returns `None` if nothing matches or the path tries to leave the
/// root.
pub fn resolve(
    resources: &dyn Resources,
    logical: &Path,
    extensions: &[String],
) -> Option<PathBuf> {
    let logical = sanitize(logical)?;
    extensions
        .iter()
        .map(|ext| with_suffix(&logical, ext))
        .find(|candidate| resources.exists(candidate))
}

/// Strip root/current-dir components; reject `..`.
fn sanitize(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::ParentDir => return None,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Append `suffix` to the file name (`a/b` + `.md` → `a/b.md`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Owned copy of [`DEFAULT_EXTENSIONS`].
pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS
        .iter()
        .map(|&ext| ext.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|&e| e.to_owned()).collect()
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let resources = MemoryResources::new()
            .with("foo.md", "markdown")
            .with("foo.html", "html");

        let html_first = exts(&["", ".html", ".md"]);
        assert_eq!(
            resolve(&resources, Path::new("foo"), &html_first),
            Some(PathBuf::from("foo.html"))
        );

        let md_first = exts(&["", ".md", ".html"]);
        assert_eq!(
            resolve(&resources, Path::new("foo"), &md_first),
            Some(PathBuf::from("foo.md"))
        );
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let resources = MemoryResources::new()
            .with("foo.md", "")
            .with("foo.html", "");
        let list = default_extensions();
        let first = resolve(&resources, Path::new("foo"), &list);
        for _ in 0..10 {
            assert_eq!(resolve(&resources, Path::new("foo"), &list), first);
        }
    }

    #[test]
    fn test_resolve_exact_name() {
        let resources = MemoryResources::new().with("_layouts/default.html", "");
        assert_eq!(
            resolve(
                &resources,
                Path::new("_layouts/default.html"),
                &default_extensions()
            ),
            Some(PathBuf::from("_layouts/default.html"))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let resources = MemoryResources::new().with("foo.md", "");
        assert_eq!(
            resolve(&resources, Path::new("bar"), &default_extensions()),
            None
        );
    }

    #[test]
    fn test_resolve_strips_leading_slash() {
        let resources = MemoryResources::new().with("docs/intro.md", "");
        assert_eq!(
            resolve(&resources, Path::new("/docs/intro"), &default_extensions()),
            Some(PathBuf::from("docs/intro.md"))
        );
    }

    #[test]
    fn test_resolve_rejects_parent_dir() {
        let resources = MemoryResources::new().with("secret.txt", "");
        let extensions = default_extensions();
        assert_eq!(
            resolve(&resources, Path::new("docs/../secret"), &extensions),
            None
        );
        assert_eq!(resolve(&resources, Path::new(""), &extensions), None);
    }

    #[test]
    fn test_disk_resources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("posts/hello.md"), "# Hello").unwrap();

        let resources = DiskResources::new(dir.path());
        assert!(resources.exists(Path::new("posts/hello.md")));
        assert!(!resources.exists(Path::new("posts")));
        assert_eq!(
            resources.read_text(Path::new("posts/hello.md")).unwrap(),
            "# Hello"
        );
        assert_eq!(
            resolve(&resources, Path::new("posts/hello"), &default_extensions()),
            Some(PathBuf::from("posts/hello.md"))
        );
    }

    #[test]
    fn test_memory_read_missing() {
        let resources = MemoryResources::new();
        let err = resources.read_text(Path::new("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
