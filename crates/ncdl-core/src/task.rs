//! Units of work and their outcomes.
//!
//! A `Task` is created per input URL by the dispatcher; a worker turns it into
//! exactly one `Outcome`. Both are immutable once built.

use crate::fetch::{FetchError, FetchedFile};
use crate::inspect::InspectionError;
use serde::Serialize;
use std::fmt;

/// One page URL and its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub index: usize,
    pub page_ref: String,
}

impl Task {
    pub fn new(index: usize, page_ref: impl Into<String>) -> Self {
        Self {
            index,
            page_ref: page_ref.into(),
        }
    }
}

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Inspection,
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Inspection => f.write_str("inspection"),
            Stage::Fetch => f.write_str("fetch"),
        }
    }
}

/// Stage-tagged cause of a failed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Inspection(InspectionError),
    Fetch(FetchError),
}

impl Failure {
    pub fn stage(&self) -> Stage {
        match self {
            Failure::Inspection(_) => Stage::Inspection,
            Failure::Fetch(_) => Stage::Fetch,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Inspection(e) => write!(f, "{}: {}", self.stage(), e),
            Failure::Fetch(e) => write!(f, "{}: {}", self.stage(), e),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Inspection(e) => Some(e),
            Failure::Fetch(e) => Some(e),
        }
    }
}

/// Asset reference found on the page plus where it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub asset_ref: String,
    pub file: FetchedFile,
}

/// Result of processing one task. `result` holds either the delivered asset
/// or the failure, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub index: usize,
    pub page_ref: String,
    pub result: Result<Delivered, Failure>,
}

impl Outcome {
    pub fn delivered(task: Task, asset_ref: String, file: FetchedFile) -> Self {
        Self {
            index: task.index,
            page_ref: task.page_ref,
            result: Ok(Delivered { asset_ref, file }),
        }
    }

    pub fn failed(task: Task, failure: Failure) -> Self {
        Self {
            index: task.index,
            page_ref: task.page_ref,
            result: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Asset reference, present only on success.
    pub fn asset_ref(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|d| d.asset_ref.as_str())
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.result.as_ref().err()
    }

    /// Terminal state this outcome corresponds to.
    pub fn terminal_state(&self) -> TaskState {
        match &self.result {
            Ok(_) => TaskState::Fetched,
            Err(Failure::Inspection(_)) => TaskState::InspectFailed,
            Err(Failure::Fetch(_)) => TaskState::FetchFailed,
        }
    }
}

/// Per-task lifecycle. Only moves forward; there is no retry edge.
///
/// `Pending → Inspecting → {InspectFailed | Inspected} → Fetching → {FetchFailed | Fetched}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Inspecting,
    InspectFailed,
    Inspected,
    Fetching,
    FetchFailed,
    Fetched,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::InspectFailed | TaskState::FetchFailed | TaskState::Fetched
        )
    }

    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_advance_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Inspecting)
                | (Inspecting, InspectFailed)
                | (Inspecting, Inspected)
                | (Inspected, Fetching)
                | (Fetching, FetchFailed)
                | (Fetching, Fetched)
        )
    }
}
