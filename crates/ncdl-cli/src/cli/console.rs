//! Console report sink: one line per task plus a summary.

use ncdl_core::pipeline::{EventDetail, ReportEvent, ReportSink, Summary, TracingReport};

pub struct ConsoleReport {
    json: bool,
    log: TracingReport,
}

impl ConsoleReport {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            log: TracingReport,
        }
    }
}

impl ReportSink for ConsoleReport {
    fn task_reported(&mut self, event: &ReportEvent) {
        self.log.task_reported(event);
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("serialize report event: {}", e),
            }
        } else {
            println!("{}", format_event(event));
        }
    }

    fn finished(&mut self, summary: &Summary) {
        self.log.finished(summary);
        if self.json {
            let line = serde_json::json!({ "summary": summary });
            println!("{}", line);
        } else {
            println!("{}", format_summary(summary));
        }
    }
}

pub fn format_event(event: &ReportEvent) -> String {
    let prefix = format!("[{}/{}]", event.position, event.total);
    match &event.detail {
        EventDetail::Stored { path, bytes, .. } => format!(
            "{} ok   {} -> {} ({} bytes)",
            prefix,
            event.page_ref,
            path.display(),
            bytes
        ),
        EventDetail::Failed {
            stage: Some(stage),
            cause,
        } => format!("{} FAIL {}: {}: {}", prefix, event.page_ref, stage, cause),
        EventDetail::Failed { stage: None, cause } => {
            format!("{} FAIL {}: lost: {}", prefix, event.page_ref, cause)
        }
    }
}

pub fn format_summary(summary: &Summary) -> String {
    format!(
        "Summary: {} successful, {} failed, total: {}",
        summary.succeeded, summary.failed, summary.total
    )
}
