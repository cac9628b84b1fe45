//! Quire - render documents with front matter, compilers and layouts.

use anyhow::{Context, Result};
use clap::Parser;
use quire::{
    build::build_site,
    cli::{Cli, Commands},
    config::QuireConfig,
    log,
    render::{Renderer, Variables},
    watch::watch_documents,
};
use std::io::{Write, stdout};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = QuireConfig::load(&cli).context("Failed to load config")?;
    let renderer = Renderer::from_config(&config).context("Failed to load compilers")?;
    let variables = cli.variables();

    match &cli.command {
        Commands::Render { paths, .. } => render_to_stdout(&renderer, paths, &variables),
        Commands::Build { .. } => build_site(&config, &renderer).map(|_| ()),
        Commands::Watch { paths, .. } => {
            log!("watch"; "watching {} documents", paths.len());
            watch_documents(&cli, config, renderer, paths, &variables)
        }
    }
}

/// Render each document in turn, printing the results back to back.
fn render_to_stdout(renderer: &Renderer, paths: &[String], variables: &Variables) -> Result<()> {
    let mut stdout = stdout().lock();
    for path in paths {
        let output = renderer
            .render(path, variables)
            .with_context(|| format!("Failed to render `{path}`"))?;
        stdout.write_all(output.as_bytes())?;
    }
    stdout.flush()?;
    Ok(())
}
