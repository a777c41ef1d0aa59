//! Result aggregator: drains outcomes, restores input order, tallies counts.

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::report::{ReportEvent, ReportSink, Summary};
use crate::task::Outcome;

/// Drains `results` until one outcome per entry of `page_refs` arrived or the
/// channel closed, then reports every position in input order.
///
/// Positions that never received an outcome are reported as lost and counted
/// as failures. Out-of-range and duplicate indices are logged and dropped.
pub async fn collect(
    mut results: mpsc::Receiver<Outcome>,
    page_refs: &[String],
    sink: &mut dyn ReportSink,
) -> Summary {
    let expected = page_refs.len();
    let mut slots: Vec<Option<Outcome>> = vec![None; expected];
    let mut filled = 0usize;

    while filled < expected {
        let Some(outcome) = results.recv().await else {
            tracing::warn!(
                received = filled,
                expected,
                "result channel closed before all outcomes arrived"
            );
            break;
        };
        let index = outcome.index;
        let Some(slot) = slots.get_mut(index) else {
            tracing::warn!(index, expected, "ignoring out-of-range outcome");
            continue;
        };
        if slot.is_some() {
            tracing::warn!(index, "ignoring duplicate outcome");
            continue;
        }
        *slot = Some(outcome);
        filled += 1;
    }

    let mut summary = Summary {
        total: expected,
        ..Summary::default()
    };
    let mut stored_by: HashMap<PathBuf, usize> = HashMap::new();

    for (index, slot) in slots.iter().enumerate() {
        let event = match slot {
            Some(outcome) => ReportEvent::from_outcome(outcome, expected),
            None => ReportEvent::lost(index, expected, &page_refs[index]),
        };
        if event.is_success() {
            summary.succeeded += 1;
            if let Some(path) = event.stored_path() {
                if let Some(previous) = stored_by.insert(path.to_path_buf(), event.position) {
                    tracing::warn!(
                        path = %path.display(),
                        first = previous,
                        second = event.position,
                        "two tasks stored the same file; the later write wins"
                    );
                }
            }
        } else {
            summary.failed += 1;
        }
        sink.task_reported(&event);
    }

    sink.finished(&summary);
    summary
}
