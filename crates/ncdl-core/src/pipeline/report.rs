//! Per-task report events, run summary and sinks that consume them.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::task::{Failure, Outcome, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Fetched,
    InspectionFailed,
    FetchFailed,
    /// No outcome arrived for this position before the result channel closed.
    Lost,
}

impl EventKind {
    pub fn is_success(self) -> bool {
        matches!(self, EventKind::Fetched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventDetail {
    Stored {
        asset_ref: String,
        path: PathBuf,
        bytes: u64,
        sha256: String,
    },
    Failed {
        stage: Option<Stage>,
        cause: String,
    },
}

/// One line of the input-ordered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEvent {
    /// 1-based position in the input.
    pub position: usize,
    pub total: usize,
    pub page_ref: String,
    pub kind: EventKind,
    pub detail: EventDetail,
}

impl ReportEvent {
    pub fn from_outcome(outcome: &Outcome, total: usize) -> Self {
        let (kind, detail) = match &outcome.result {
            Ok(delivered) => (
                EventKind::Fetched,
                EventDetail::Stored {
                    asset_ref: delivered.asset_ref.clone(),
                    path: delivered.file.path.clone(),
                    bytes: delivered.file.bytes,
                    sha256: delivered.file.sha256.clone(),
                },
            ),
            Err(failure) => {
                let kind = match failure {
                    Failure::Inspection(_) => EventKind::InspectionFailed,
                    Failure::Fetch(_) => EventKind::FetchFailed,
                };
                let cause = match failure {
                    Failure::Inspection(e) => e.to_string(),
                    Failure::Fetch(e) => e.to_string(),
                };
                (
                    kind,
                    EventDetail::Failed {
                        stage: Some(failure.stage()),
                        cause,
                    },
                )
            }
        };
        Self {
            position: outcome.index + 1,
            total,
            page_ref: outcome.page_ref.clone(),
            kind,
            detail,
        }
    }

    pub fn lost(index: usize, total: usize, page_ref: &str) -> Self {
        Self {
            position: index + 1,
            total,
            page_ref: page_ref.to_string(),
            kind: EventKind::Lost,
            detail: EventDetail::Failed {
                stage: None,
                cause: "no result received for this task".to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind.is_success()
    }

    pub fn stored_path(&self) -> Option<&Path> {
        match &self.detail {
            EventDetail::Stored { path, .. } => Some(path),
            EventDetail::Failed { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Failed { cause, .. } => Some(cause),
            EventDetail::Stored { .. } => None,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match &self.detail {
            EventDetail::Failed { stage, .. } => *stage,
            EventDetail::Stored { .. } => None,
        }
    }
}

/// End-of-run counts. `succeeded + failed == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl Summary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Receives the ordered report of a run.
pub trait ReportSink {
    fn task_reported(&mut self, event: &ReportEvent);
    fn finished(&mut self, summary: &Summary);
}

/// Writes every event to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingReport;

impl ReportSink for TracingReport {
    fn task_reported(&mut self, event: &ReportEvent) {
        match &event.detail {
            EventDetail::Stored { path, bytes, .. } => tracing::info!(
                position = event.position,
                total = event.total,
                url = %event.page_ref,
                path = %path.display(),
                bytes = *bytes,
                "asset downloaded"
            ),
            EventDetail::Failed { stage, cause } => tracing::warn!(
                position = event.position,
                total = event.total,
                url = %event.page_ref,
                stage = ?stage,
                "task failed: {}",
                cause
            ),
        }
    }

    fn finished(&mut self, summary: &Summary) {
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total = summary.total,
            "run finished"
        );
    }
}

/// Keeps events and the summary in memory.
#[derive(Debug, Default)]
pub struct MemoryReport {
    pub events: Vec<ReportEvent>,
    pub summary: Option<Summary>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for MemoryReport {
    fn task_reported(&mut self, event: &ReportEvent) {
        self.events.push(event.clone());
    }

    fn finished(&mut self, summary: &Summary) {
        self.summary = Some(*summary);
    }
}
