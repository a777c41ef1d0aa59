//! CLI for ncdl.

mod commands;
mod console;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ncdl_core::config::{self, Accent, NcdlConfig};
use std::path::PathBuf;

use commands::run_download;

/// Pronunciation variant accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccentArg {
    Us,
    Uk,
    Ca,
}

impl From<AccentArg> for Accent {
    fn from(a: AccentArg) -> Self {
        match a {
            AccentArg::Us => Accent::Us,
            AccentArg::Uk => Accent::Uk,
            AccentArg::Ca => Accent::Ca,
        }
    }
}

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ncdl")]
#[command(about = "ncdl: download pronunciation audio from dictionary pages", long_about = None)]
pub struct Cli {
    /// Pronunciation variant to download.
    #[arg(
        short = 'p',
        long = "pronunciation",
        value_enum,
        ignore_case = true,
        default_value = "us"
    )]
    pub accent: AccentArg,

    /// Number of concurrent workers (overrides config).
    #[arg(short = 'c', long, value_name = "N", value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Directory to store downloaded files in (overrides config).
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Read configuration from FILE instead of the XDG config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print report lines as JSON.
    #[arg(long)]
    pub json: bool,

    /// Page URLs to process, in order.
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a positive number", s))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}

impl Cli {
    /// Command-line flags win over config file values.
    pub fn apply_overrides(&self, cfg: &mut NcdlConfig) {
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
    }
}

/// Parses arguments and runs the download. Returns the process exit code:
/// 0 when every task succeeded, 3 when any failed. Usage errors exit with
/// clap's status 2 before this returns; `Err` maps to 1 in `main`.
pub async fn run_from_args() -> Result<i32> {
    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    cli.apply_overrides(&mut cfg);
    tracing::debug!("loaded config: {:?}", cfg);

    run_download(&cfg, cli.accent.into(), &cli.urls, cli.json).await
}

#[cfg(test)]
mod tests;
