use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use ytm4a_core::{Headline, ItemDetails, QueueViewModel};
use ytm4a_engine::{ProcessSummary, RunOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// One status message for the user, as the popup's status bar would show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    pub severity: Severity,
}

impl Report {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

pub fn render_queue(view: &QueueViewModel) -> String {
    let mut out = String::new();
    let headline = match view.headline {
        Headline::Empty => {
            out.push_str("No videos in queue\n");
            return out;
        }
        Headline::Processing(count) => format!("Processing {count} item(s)..."),
        Headline::Ready(count) => format!("{count} item(s) ready to process"),
        Headline::AllProcessed => "All items processed".to_string(),
    };
    let _ = writeln!(out, "Status: {headline}");

    for row in &view.rows {
        let _ = write!(out, "  {:<14} {:<10} {}", row.id, row.status.as_str(), row.title);
        if let Some(error) = &row.error {
            let _ = write!(out, "  (error: {error})");
        }
        if !row.removable {
            out.push_str("  [in flight]");
        }
        out.push('\n');
    }
    out
}

pub fn render_details(details: &ItemDetails) -> String {
    let mut lines = vec![
        format!("Title: {}", details.title),
        format!("Folder: {}", details.folder),
        format!("Status: {}", details.status),
        format!("Added: {}", local_time(details.added_at)),
    ];
    if let Some(ticker) = &details.ticker_symbol {
        lines.push(format!("Ticker: {ticker}"));
    }
    if let Some(completed_at) = details.completed_at {
        lines.push(format!("Completed: {}", local_time(completed_at)));
    }
    if let Some(error) = &details.error {
        lines.push(format!("Error: {error}"));
    }
    lines.join("\n")
}

pub fn summary_report(summary: &ProcessSummary) -> Report {
    match summary.outcome() {
        RunOutcome::CompletedWithErrors => Report::error(format!(
            "Queue processing completed with errors. {} items succeeded.",
            summary.succeeded
        )),
        RunOutcome::Completed => Report::success(format!(
            "Queue processing complete! {} items processed.",
            summary.succeeded
        )),
        RunOutcome::NothingProcessed => Report::error("No items were processed."),
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
