//! Dispatcher: one task per input URL onto the work channel.

use tokio::sync::mpsc;

use crate::task::Task;

/// Sends `Task { index: i, page_ref: urls[i] }` in input order, then drops
/// the sender so workers see the channel close once it is drained.
///
/// The channel is expected to hold at least `urls.len()` tasks, so this never
/// waits on worker throughput.
pub async fn submit(urls: &[String], tasks: mpsc::Sender<Task>) {
    for (index, url) in urls.iter().enumerate() {
        if tasks.send(Task::new(index, url.clone())).await.is_err() {
            tracing::warn!(
                unsent = urls.len() - index,
                "work channel closed before submission finished"
            );
            return;
        }
    }
    tracing::debug!(count = urls.len(), "all tasks submitted");
}
