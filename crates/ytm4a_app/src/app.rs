use std::io::Write;

use ytm4a_core::{ClearPrompt, EnqueueRequest};
use ytm4a_engine::{EngineError, EnqueueResult, QueueEngine};
use ytm4a_logging::queue_debug;

use crate::cli::Command;
use crate::ui::prompt::Confirm;
use crate::ui::render::{render_details, render_queue, summary_report, Report, Severity};

/// Runs one user command against the engine and prints the outcome.
///
/// Rejected input and refused operations come back as an error `Report`;
/// only output failures are returned as `Err`.
pub async fn run_command(
    engine: &QueueEngine,
    command: Command,
    prompt: &mut dyn Confirm,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    queue_debug!("Running {:?}", command);
    let report = match command {
        Command::Add {
            url,
            title,
            folder,
            ticker,
        } => {
            let mut request = EnqueueRequest::new(url, title, folder);
            request.ticker_symbol = ticker;
            add(engine, request, prompt).await
        }
        Command::Process => match engine.process_all().await {
            Ok(summary) => summary_report(&summary),
            Err(EngineError::QueueEmpty) => Report::error("Queue is empty"),
            Err(err) => Report::error(format!("Error: {err}")),
        },
        Command::Refresh => match engine.refresh().await {
            0 => Report::success("Queue refreshed"),
            recovered => Report::success(format!(
                "Refreshed queue and recovered {recovered} stuck item(s)"
            )),
        },
        Command::Remove { id } => match engine.remove(&id).await {
            Ok(Some(_)) => Report::success("Item removed from queue"),
            Ok(None) => Report::success("Item not in queue"),
            Err(EngineError::Conflict(_)) => {
                Report::error("Can't remove an item that's currently processing")
            }
            Err(err) => Report::error(err.to_string()),
        },
        Command::Clear => clear(engine, prompt).await,
        Command::List => {
            write!(out, "{}", render_queue(&engine.view().await))?;
            return Ok(Report::success(""));
        }
        Command::Show { id } => match engine.details(&id).await {
            Some(details) => {
                let severity = if details.error.is_some() {
                    Severity::Error
                } else {
                    Severity::Success
                };
                Report {
                    message: render_details(&details),
                    severity,
                }
            }
            None => Report::error(format!("No queue item with id {id}")),
        },
    };

    if !report.message.is_empty() {
        writeln!(out, "{}", report.message)?;
    }
    Ok(report)
}

async fn add(engine: &QueueEngine, request: EnqueueRequest, prompt: &mut dyn Confirm) -> Report {
    let result = match engine.enqueue(&request).await {
        Ok(EnqueueResult::DuplicateFound { .. }) => {
            if !prompt.confirm("This video is already in the queue. Add it again?") {
                return Report::error("Not added");
            }
            engine.enqueue(&request.allowing_duplicate()).await
        }
        other => other,
    };
    match result {
        Ok(EnqueueResult::Added { item, .. }) => {
            Report::success(format!("Added to queue! (id {})", item.id()))
        }
        Ok(EnqueueResult::DuplicateFound { .. }) => Report::error("Not added"),
        Err(err) => Report::error(capitalize(&err.to_string())),
    }
}

async fn clear(engine: &QueueEngine, prompt: &mut dyn Confirm) -> Report {
    let question = match engine.clear_prompt().await {
        ClearPrompt::AlreadyEmpty => return Report::error("Queue is already empty"),
        ClearPrompt::NeedsProcessingConfirmation => {
            "Some items are still processing. Clear queue anyway?"
        }
        ClearPrompt::NeedsConfirmation => {
            "Are you sure you want to clear all items from the queue?"
        }
    };
    if !prompt.confirm(question) {
        return Report::error("Queue not cleared");
    }
    engine.clear().await;
    Report::success("Queue cleared")
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ytm4a_core::ItemStatus;
    use ytm4a_engine::{
        EngineConfig, MemoryStore, ProcessingService, ServiceError, SubmitRequest,
        SubmitResponse,
    };

    use super::*;
    use crate::ui::prompt::ScriptedConfirm;

    struct AlwaysSucceeds;

    #[async_trait::async_trait]
    impl ProcessingService for AlwaysSucceeds {
        async fn submit(&self, _request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
            Ok(SubmitResponse::success())
        }
    }

    fn engine(store: &MemoryStore) -> QueueEngine {
        QueueEngine::new(
            Arc::new(store.clone()),
            Arc::new(AlwaysSucceeds),
            EngineConfig::default(),
        )
    }

    fn add_cmd(video: &str, folder: &str, ticker: Option<&str>) -> Command {
        Command::Add {
            url: format!("https://www.youtube.com/watch?v={video}"),
            title: format!("Video {video}"),
            folder: folder.to_string(),
            ticker: ticker.map(str::to_string),
        }
    }

    async fn run(engine: &QueueEngine, command: Command, prompt: &mut ScriptedConfirm) -> Report {
        let mut out = Vec::new();
        run_command(engine, command, prompt, &mut out).await.unwrap()
    }

    #[tokio::test]
    async fn add_reports_validation_errors_inline() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let mut prompt = ScriptedConfirm::new(&[]);

        let report = run(&engine, add_cmd("a", "Economics", None), &mut prompt).await;
        assert_eq!(
            report,
            Report::error("Please enter a ticker symbol for Economics videos")
        );
        assert!(store.snapshot().is_empty());

        let report = run(&engine, add_cmd("a", "Economics", Some("SPY")), &mut prompt).await;
        assert_eq!(report.severity, Severity::Success);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_add_follows_the_users_answer() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let mut prompt = ScriptedConfirm::new(&[false, true]);

        run(&engine, add_cmd("a", "General", None), &mut prompt).await;
        let declined = run(&engine, add_cmd("a", "General", None), &mut prompt).await;
        assert_eq!(declined, Report::error("Not added"));
        assert_eq!(store.snapshot().len(), 1);

        let accepted = run(&engine, add_cmd("a", "General", None), &mut prompt).await;
        assert_eq!(accepted.severity, Severity::Success);
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(prompt.asked.len(), 2);
    }

    #[tokio::test]
    async fn process_then_list_shows_completed_items() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let mut prompt = ScriptedConfirm::new(&[]);

        assert_eq!(
            run(&engine, Command::Process, &mut prompt).await,
            Report::error("Queue is empty")
        );

        run(&engine, add_cmd("a", "General", None), &mut prompt).await;
        let report = run(&engine, Command::Process, &mut prompt).await;
        assert_eq!(
            report,
            Report::success("Queue processing complete! 1 items processed.")
        );
        assert_eq!(store.snapshot()[0].status(), ItemStatus::Complete);

        let mut out = Vec::new();
        run_command(&engine, Command::List, &mut prompt, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Status: All items processed"));
    }

    #[tokio::test]
    async fn clear_asks_first_and_refuses_on_empty_queue() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let mut prompt = ScriptedConfirm::new(&[false, true]);

        assert_eq!(
            run(&engine, Command::Clear, &mut prompt).await,
            Report::error("Queue is already empty")
        );
        assert!(prompt.asked.is_empty());

        run(&engine, add_cmd("a", "General", None), &mut prompt).await;
        assert_eq!(
            run(&engine, Command::Clear, &mut prompt).await,
            Report::error("Queue not cleared")
        );
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(
            run(&engine, Command::Clear, &mut prompt).await,
            Report::success("Queue cleared")
        );
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn remove_of_unknown_id_is_harmless() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let mut prompt = ScriptedConfirm::new(&[]);
        let report = run(
            &engine,
            Command::Remove {
                id: "missing".to_string(),
            },
            &mut prompt,
        )
        .await;
        assert_eq!(report.severity, Severity::Success);
    }
}
