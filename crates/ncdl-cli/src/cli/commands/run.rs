//! `ncdl <URL>...` – run the pipeline over the given pages.

use anyhow::Result;
use ncdl_core::config::{Accent, NcdlConfig};
use ncdl_core::pipeline::{Pipeline, Summary};

use crate::cli::console::ConsoleReport;

pub async fn run_download(
    cfg: &NcdlConfig,
    accent: Accent,
    urls: &[String],
    json: bool,
) -> Result<i32> {
    let pipeline = Pipeline::from_config(cfg, accent)?;
    tracing::info!(
        accent = %accent,
        urls = urls.len(),
        workers = cfg.concurrency,
        "starting download"
    );

    let mut console = ConsoleReport::new(json);
    let summary = pipeline.run(urls, &mut console).await?;
    Ok(exit_code(&summary))
}

/// Exit status when at least one task failed. Distinct from clap's usage
/// error status (2) and fatal setup errors (1).
pub const EXIT_TASK_FAILED: i32 = 3;

pub fn exit_code(summary: &Summary) -> i32 {
    if summary.all_succeeded() {
        0
    } else {
        EXIT_TASK_FAILED
    }
}
