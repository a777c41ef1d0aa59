//! Concurrent task pipeline.
//!
//! Dispatcher → worker pool (N workers) → result aggregator. Tasks travel on
//! one bounded channel, outcomes on another; the aggregator's drain loop is
//! where the run completes.

pub mod aggregate;
pub mod dispatch;
pub mod report;
pub mod worker;

pub use report::{EventDetail, EventKind, MemoryReport, ReportEvent, ReportSink, Summary, TracingReport};
pub use worker::{WorkerContext, WorkerPool};

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::{Accent, NcdlConfig};
use crate::fetch::{CurlFetcher, Fetcher};
use crate::inspect::{CurlInspector, Locator, PageInspector};
use crate::storage;

/// Per-run parameters of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub workers: usize,
    pub locator: Locator,
    pub output_dir: PathBuf,
    pub page_load_timeout: Duration,
    pub element_wait_timeout: Duration,
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("worker count must be at least 1");
        }
        if self.page_load_timeout.is_zero() || self.element_wait_timeout.is_zero() {
            anyhow::bail!("timeouts must be greater than zero");
        }
        Ok(())
    }
}

pub struct Pipeline {
    settings: PipelineSettings,
    inspector: Arc<dyn PageInspector>,
    fetcher: Arc<dyn Fetcher>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        inspector: Arc<dyn PageInspector>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            settings,
            inspector,
            fetcher,
        }
    }

    /// Pipeline with the curl-backed inspector and fetcher configured from `config`.
    pub fn from_config(config: &NcdlConfig, accent: Accent) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let locator = Locator::parse(config.locator_for(accent))
            .with_context(|| format!("locator for accent {}", accent))?;

        let settings = PipelineSettings {
            workers: config.concurrency,
            locator,
            output_dir: config.output_dir.clone(),
            page_load_timeout: config.page_load_timeout(),
            element_wait_timeout: config.element_wait_timeout(),
        };
        let inspector = CurlInspector::new(config.asset_attribute.clone())
            .with_user_agent(config.user_agent.clone());
        let fetcher =
            CurlFetcher::new(config.download_timeout()).with_user_agent(config.user_agent.clone());

        Ok(Self::new(settings, Arc::new(inspector), Arc::new(fetcher)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Processes `urls` and reports every one of them to `sink` in input order.
    ///
    /// Per-task failures end up in the report; only setup problems (invalid
    /// settings, output directory not creatable) return `Err`, before any task
    /// is dispatched.
    pub async fn run(&self, urls: &[String], sink: &mut dyn ReportSink) -> Result<Summary> {
        self.settings.validate()?;
        storage::ensure_dir(&self.settings.output_dir)?;

        let total = urls.len();
        tracing::info!(
            total,
            workers = self.settings.workers,
            output_dir = %self.settings.output_dir.display(),
            "starting run"
        );

        let capacity = total.max(1);
        let (task_tx, task_rx) = mpsc::channel(capacity);
        let (result_tx, result_rx) = mpsc::channel(capacity);

        let ctx = Arc::new(WorkerContext {
            inspector: Arc::clone(&self.inspector),
            fetcher: Arc::clone(&self.fetcher),
            locator: self.settings.locator.clone(),
            output_dir: self.settings.output_dir.clone(),
            page_load_timeout: self.settings.page_load_timeout,
            element_wait_timeout: self.settings.element_wait_timeout,
        });
        let pool = WorkerPool::spawn(self.settings.workers, task_rx, result_tx, ctx);

        dispatch::submit(urls, task_tx).await;
        let summary = aggregate::collect(result_rx, urls, sink).await;
        pool.join().await;

        Ok(summary)
    }
}
