//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::render::Variables;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire document renderer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the project root
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render documents to stdout
    Render {
        /// Logical document paths, relative to `[build].root`
        #[arg(required = true)]
        paths: Vec<String>,

        /// Extra variable, overriding front matter (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, serde_json::Value)>,
    },

    /// Render every document of the site into the output directory
    Build {
        /// Output directory (relative to the project root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clean output directory completely before building
        #[arg(long)]
        clean: bool,
    },

    /// Render documents, then re-render them whenever a source changes
    Watch {
        /// Logical document paths, relative to `[build].root`
        #[arg(required = true)]
        paths: Vec<String>,

        /// Extra variable, overriding front matter (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, serde_json::Value)>,
    },
}

impl Cli {
    /// Variables passed with `--var`, later flags winning.
    pub fn variables(&self) -> Variables {
        match &self.command {
            Commands::Render { vars, .. } | Commands::Watch { vars, .. } => {
                vars.iter().cloned().collect()
            }
            Commands::Build { .. } => Variables::new(),
        }
    }
}

/// `n=3` → `("n", 3)`; the value is read as a YAML scalar so numbers and
/// booleans keep their type, anything unparsable stays a string.
fn parse_var(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{arg}`"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in `{arg}`"));
    }

    let value = Some(value)
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| serde_yaml::from_str::<serde_json::Value>(v).ok())
        .filter(|v| !v.is_object() && !v.is_array())
        .unwrap_or_else(|| serde_json::Value::from(value));
    Ok((key.to_owned(), value))
}
