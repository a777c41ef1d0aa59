//! Worker pool: N tasks pulling from the shared work channel.
//!
//! Each loop iteration turns one `Task` into exactly one `Outcome`. Capability
//! calls run in their own tokio task so a panic there becomes a failed outcome
//! instead of killing the worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::control::AbortToken;
use crate::fetch::{FetchError, Fetcher};
use crate::inspect::{InspectRequest, InspectionError, Locator, PageInspector};
use crate::task::{Failure, Outcome, Task, TaskState};

/// Read-only state shared by every worker of one run.
pub struct WorkerContext {
    pub inspector: Arc<dyn PageInspector>,
    pub fetcher: Arc<dyn Fetcher>,
    pub locator: Locator,
    pub output_dir: PathBuf,
    pub page_load_timeout: Duration,
    pub element_wait_timeout: Duration,
}

/// Handles of the spawned workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers (at least one) on the current runtime.
    /// `results` is dropped once every worker has exited.
    pub fn spawn(
        worker_count: usize,
        tasks: mpsc::Receiver<Task>,
        results: mpsc::Sender<Outcome>,
        ctx: Arc<WorkerContext>,
    ) -> Self {
        let tasks = Arc::new(Mutex::new(tasks));
        let handles = (0..worker_count.max(1))
            .map(|id| {
                let tasks = Arc::clone(&tasks);
                let results = results.clone();
                let ctx = Arc::clone(&ctx);
                tokio::spawn(worker_loop(id, tasks, results, ctx))
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every worker loop to exit. Abandoned inspections are not
    /// waited for.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("worker join: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<Task>>>,
    results: mpsc::Sender<Outcome>,
    ctx: Arc<WorkerContext>,
) {
    tracing::debug!(worker = id, "worker started");
    loop {
        let next = tasks.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };
        let outcome = process_task(&ctx, task).await;
        if results.send(outcome).await.is_err() {
            tracing::warn!(worker = id, "result channel closed; worker exiting");
            break;
        }
    }
    tracing::debug!(worker = id, "worker finished");
}

fn advance(index: usize, from: TaskState, to: TaskState) {
    debug_assert!(from.can_advance_to(to), "{:?} -> {:?}", from, to);
    tracing::debug!(task = index, from = ?from, to = ?to, "task state");
}

/// Inspect then fetch one task. Always yields an outcome for `task`.
pub async fn process_task(ctx: &WorkerContext, task: Task) -> Outcome {
    advance(task.index, TaskState::Pending, TaskState::Inspecting);
    let asset_ref = match inspect_bounded(ctx, &task.page_ref).await {
        Ok(asset_ref) => asset_ref,
        Err(e) => {
            advance(task.index, TaskState::Inspecting, TaskState::InspectFailed);
            return Outcome::failed(task, Failure::Inspection(e));
        }
    };
    advance(task.index, TaskState::Inspecting, TaskState::Inspected);

    advance(task.index, TaskState::Inspected, TaskState::Fetching);
    match fetch(ctx, &asset_ref).await {
        Ok(file) => {
            advance(task.index, TaskState::Fetching, TaskState::Fetched);
            Outcome::delivered(task, asset_ref, file)
        }
        Err(e) => {
            advance(task.index, TaskState::Fetching, TaskState::FetchFailed);
            Outcome::failed(task, Failure::Fetch(e))
        }
    }
}

/// Runs the inspector bounded by the element-wait window. On expiry the
/// request's abort token is tripped and the inspection is left running
/// detached.
async fn inspect_bounded(ctx: &WorkerContext, page_ref: &str) -> Result<String, InspectionError> {
    let request = InspectRequest {
        page_ref: page_ref.to_string(),
        locator: ctx.locator.clone(),
        page_load_timeout: ctx.page_load_timeout,
        element_wait_timeout: ctx.element_wait_timeout,
        abort: AbortToken::new(),
    };
    let abort = request.abort.clone();
    let inspector = Arc::clone(&ctx.inspector);
    let handle = tokio::spawn(async move { inspector.inspect(&request).await });

    match tokio::time::timeout(ctx.element_wait_timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(InspectionError::Navigation {
            url: page_ref.to_string(),
            reason: format!("inspection task failed: {}", join_err),
        }),
        Err(_) => {
            abort.abort();
            tracing::debug!(
                url = %page_ref,
                waited_ms = ctx.element_wait_timeout.as_millis() as u64,
                "inspection abandoned"
            );
            Err(InspectionError::ElementTimeout {
                url: page_ref.to_string(),
                waited: ctx.element_wait_timeout,
            })
        }
    }
}

async fn fetch(ctx: &WorkerContext, asset_ref: &str) -> Result<crate::fetch::FetchedFile, FetchError> {
    let fetcher = Arc::clone(&ctx.fetcher);
    let url = asset_ref.to_string();
    let dir = ctx.output_dir.clone();
    let handle = tokio::spawn(async move { fetcher.fetch(&url, &dir).await });
    match handle.await {
        Ok(result) => result,
        Err(join_err) => Err(FetchError::Transport {
            url: asset_ref.to_string(),
            reason: format!("fetch task failed: {}", join_err),
        }),
    }
}
