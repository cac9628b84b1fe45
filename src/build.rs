//! Site building orchestration.
//!
//! Renders every document below `[build].root` into the output directory.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()      clean / create the output directory
//!     │
//!     ├── collect_documents()   walk the root, skipping layouts, includes,
//!     │                         the output dir, scripts and hidden entries
//!     │
//!     └── par_iter ──► Renderer::render_path() ──► <output>/<rel>.html
//! ```

use crate::{
    config::QuireConfig,
    log,
    render::{Renderer, Variables},
};
use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};
use walkdir::{DirEntry, WalkDir};

/// Extension of every rendered file.
const OUTPUT_EXTENSION: &str = "html";

/// Render the whole site in parallel. Returns the number of files written.
///
/// Stops at the first failing document; its error is logged and returned.
pub fn build_site(config: &QuireConfig, renderer: &Renderer) -> Result<usize> {
    let output = &config.build.output;
    prepare_output(output, config.build.clean)?;

    let documents = collect_documents(config);
    let targets = plan_outputs(&documents, output)?;
    log!("build"; "rendering {} documents", targets.len());

    let has_error = AtomicBool::new(false);
    let variables = Variables::new();

    targets.par_iter().try_for_each(|(source, target)| {
        if has_error.load(Ordering::Relaxed) {
            return Err(anyhow!("Aborted"));
        }
        if let Err(e) = render_one(renderer, source, target, &variables) {
            if !has_error.swap(true, Ordering::Relaxed) {
                log!("error"; "{}: {:#}", source.display(), e);
            }
            return Err(e);
        }
        Ok(())
    })?;

    log!("build"; "done, {} files written to {}", targets.len(), output.display());
    Ok(targets.len())
}

/// Render one document and write it to `target`.
pub fn render_one(
    renderer: &Renderer,
    source: &Path,
    target: &Path,
    variables: &Variables,
) -> Result<()> {
    let html = renderer.render_path(source, variables)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(target, html).with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

/// Create the output directory, removing it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Renderable documents, relative to `[build].root`, in walk order.
pub fn collect_documents(config: &QuireConfig) -> Vec<PathBuf> {
    let root = &config.build.root;
    let skipped_dirs = [
        root.join(&config.build.layouts),
        root.join(&config.build.includes),
        config.build.output.clone(),
    ];
    let skipped_files: Vec<&Path> = config
        .compilers
        .script
        .iter()
        .map(|script| script.program.as_path())
        .chain([config.config_path.as_path()])
        .collect();

    let is_skipped = |entry: &DirEntry| {
        entry.depth() > 0
            && (is_hidden(entry) || skipped_dirs.iter().any(|dir| entry.path() == dir))
    };

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| !skipped_files.contains(&e.path()))
        .filter(|e| has_document_extension(e.path(), &config.build.extensions))
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

/// Map each document to its output file, rejecting two documents that
/// would overwrite each other (`a.md` and `a.html`).
fn plan_outputs(documents: &[PathBuf], output: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut seen: FxHashMap<PathBuf, &Path> = FxHashMap::default();
    let mut targets = Vec::with_capacity(documents.len());

    for doc in documents {
        let target = output.join(doc).with_extension(OUTPUT_EXTENSION);
        if let Some(other) = seen.insert(target.clone(), doc) {
            bail!(
                "`{}` and `{}` both render to `{}`",
                other.display(),
                doc.display(),
                target.display()
            );
        }
        targets.push((doc.clone(), target));
    }

    Ok(targets)
}

/// `.git`, `.DS_Store`, editor swap files.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Whether the file carries one of the non-empty probing extensions.
fn has_document_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .filter(|ext| !ext.is_empty())
        .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
}
