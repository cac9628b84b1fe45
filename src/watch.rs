//! File system watcher for live re-rendering.
//!
//! Renders the requested documents into the output directory, then watches
//! the site and re-renders them when something they may depend on changes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  config  → new Renderer│  │
//! │                                  │  script  → reload Lua  │  │
//! │                                  │  layout/partial → all  │  │
//! │                                  │  content → matching    │  │
//! │                                  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The current [`Renderer`] lives in an [`ArcSwap`]: render workers load
//! it without locking, and a config change swaps in a fresh one.

use crate::{
    build::render_one,
    cli::Cli,
    config::QuireConfig,
    log,
    logger::WatchStatus,
    render::{Renderer, Variables},
    utils::category::{FileCategory, categorize_path, watch_targets},
};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to `root` for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events into one change set.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    delay: Duration,
}

impl Debouncer {
    fn new(delay: Duration) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            delay,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.delay)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            self.delay
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// What a batch of changes requires.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    reload_config: bool,
    reload_scripts: bool,
    render_all: bool,
    changed_content: Vec<PathBuf>,
}

impl Plan {
    fn from_paths(paths: &[PathBuf], config: &QuireConfig) -> Self {
        let mut plan = Self::default();
        for path in paths {
            let category = categorize_path(path, config);
            match category {
                FileCategory::Config => plan.reload_config = true,
                FileCategory::Script => plan.reload_scripts = true,
                FileCategory::Content => {
                    plan.changed_content.push(QuireConfig::normalize_path(path))
                }
                FileCategory::Layout | FileCategory::Partial | FileCategory::Unknown => {}
            }
            plan.render_all |= category.affects_all();
        }
        plan
    }

    fn is_empty(&self) -> bool {
        !self.render_all && self.changed_content.is_empty()
    }
}

/// Watched documents plus the state needed to re-render them.
struct Session<'a> {
    cli: &'a Cli,
    config: QuireConfig,
    renderer: ArcSwap<Renderer>,
    documents: &'a [String],
    variables: &'a Variables,
    status: WatchStatus,
}

impl Session<'_> {
    /// Output file for a resolved document.
    fn target(&self, source: &Path) -> PathBuf {
        self.config.build.output.join(source).with_extension("html")
    }

    /// Render `documents`, reporting the first failure.
    fn render(&mut self, documents: &[&String]) {
        let renderer = self.renderer.load_full();
        let results: Vec<(&String, Result<()>)> = documents
            .par_iter()
            .map(|&logical| {
                let result = renderer
                    .resolve(logical)
                    .with_context(|| format!("template not found: `{logical}`"))
                    .and_then(|source| {
                        render_one(&renderer, &source, &self.target(&source), self.variables)
                    });
                (logical, result)
            })
            .collect();

        match results.iter().find(|(_, r)| r.is_err()) {
            Some((logical, Err(e))) => {
                self.status.error(&format!("failed: {logical}"), &format!("{e:#}"))
            }
            _ => {
                let names: Vec<&str> = documents.iter().map(|d| d.as_str()).collect();
                self.status.success(&format!("rendered: {}", names.join(", ")));
            }
        }
    }

    fn render_all(&mut self) {
        let documents = self.documents;
        self.render(&documents.iter().collect::<Vec<_>>());
    }

    /// Re-read `quire.toml` and swap in a renderer built from it.
    fn reload_config(&mut self) -> Result<()> {
        let config = QuireConfig::load(self.cli).context("Failed to reload config")?;
        let renderer = Renderer::from_config(&config).context("Failed to load compilers")?;
        self.config = config;
        self.renderer.store(Arc::new(renderer));
        Ok(())
    }

    fn handle_changes(&mut self, paths: &[PathBuf]) {
        let plan = Plan::from_paths(paths, &self.config);
        if plan.is_empty() {
            return;
        }

        let root = self.config.build.root.clone();
        let trigger = paths
            .iter()
            .map(|p| rel_path(p, &root))
            .collect::<Vec<_>>()
            .join(", ");
        self.status.detach();
        log!("watch"; "{trigger} changed");

        // A rebuilt renderer loads its scripts fresh.
        if plan.reload_config {
            if let Err(e) = self.reload_config() {
                self.status.error("config reload failed", &format!("{e:#}"));
                return;
            }
        } else if plan.reload_scripts
            && let Err(e) = self.renderer.load().compilers().reload_scripts()
        {
            self.status.error("script reload failed", &format!("{e:#}"));
            return;
        }

        if plan.render_all {
            self.render_all();
            return;
        }

        let renderer = self.renderer.load_full();
        let documents = self.documents;
        let affected: Vec<&String> = documents
            .iter()
            .filter(|logical| {
                renderer
                    .resolve(logical)
                    .map(|source| QuireConfig::normalize_path(&root.join(source)))
                    .is_some_and(|source| plan.changed_content.contains(&source))
            })
            .collect();

        if !affected.is_empty() {
            self.render(&affected);
        }
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &QuireConfig) -> Result<()> {
    let root = &config.build.root;
    for (path, is_dir) in watch_targets(config) {
        let mode = if is_dir {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        log!("watch"; "watching {}", rel_path(&path, root));
    }
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Render `documents`, then block re-rendering them on change.
pub fn watch_documents(
    cli: &Cli,
    config: QuireConfig,
    renderer: Renderer,
    documents: &[String],
    variables: &Variables,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;

    let mut debouncer = Debouncer::new(Duration::from_millis(config.watch.debounce_ms));
    let mut session = Session {
        cli,
        config,
        renderer: ArcSwap::from_pointee(renderer),
        documents,
        variables,
        status: WatchStatus::new(),
    };
    session.render_all();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                session.handle_changes(&debouncer.take());
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
