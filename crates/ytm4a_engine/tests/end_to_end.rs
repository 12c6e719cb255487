mod common;

use std::sync::Arc;

use common::{init_logging, t0, watch_url, ScriptedProcessor, TestClock};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytm4a_core::{EnqueueRequest, ItemStatus};
use ytm4a_engine::{
    JsonFileStore, ProcessorSettings, QueueEngine, QueueStore, ReqwestProcessor, RunOutcome,
};

#[tokio::test]
async fn queue_survives_reopen_and_processes_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .and(body_partial_json(json!({ "custom_title": "Good" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .and(body_partial_json(json!({ "custom_title": "Bad" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "Missing required fields: url and category",
        })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let store_path = temp.path().join("storage.json");
    let clock = TestClock::new(t0());
    let processor = Arc::new(ReqwestProcessor::new(ProcessorSettings {
        endpoint: format!("{}/process", server.uri()),
        ..ProcessorSettings::default()
    }));

    {
        let engine = QueueEngine::open(
            Arc::new(JsonFileStore::new(&store_path)),
            processor.clone(),
            clock.config(),
        )
        .await;
        engine
            .enqueue(&EnqueueRequest::new(watch_url("good"), "Good", "General"))
            .await
            .unwrap();
        engine
            .enqueue(&EnqueueRequest::new(watch_url("bad"), "Bad", "General"))
            .await
            .unwrap();
    }

    // A new session picks the queue up from disk.
    let engine = QueueEngine::open(
        Arc::new(JsonFileStore::new(&store_path)),
        processor,
        clock.config(),
    )
    .await;
    assert_eq!(engine.snapshot().await.len(), 2);

    let summary = engine.process_all().await.unwrap();
    assert_eq!(summary.outcome(), RunOutcome::CompletedWithErrors);
    assert_eq!((summary.succeeded, summary.failed), (1, 1));

    let on_disk = JsonFileStore::new(&store_path).load().await;
    assert_eq!(on_disk[0].status(), ItemStatus::Complete);
    assert_eq!(on_disk[1].status(), ItemStatus::Failed);
    assert_eq!(
        on_disk[1].error(),
        Some("Missing required fields: url and category")
    );
}

#[tokio::test]
async fn enqueue_keeps_items_written_by_older_versions() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store_path = temp.path().join("storage.json");
    let unknown = json!({ "id": "9", "status": "archived", "addedAt": t0().to_rfc3339() });
    let record = json!({
        "ytm4a_queue": [
            {
                "id": "1",
                "url": watch_url("old"),
                "title": "Old",
                "status": "pending",
                "addedAt": t0().to_rfc3339(),
            },
            unknown.clone(),
        ]
    });
    std::fs::write(&store_path, record.to_string()).unwrap();

    let clock = TestClock::new(t0());
    let engine = QueueEngine::open(
        Arc::new(JsonFileStore::new(&store_path)),
        Arc::new(ScriptedProcessor::default()),
        clock.config(),
    )
    .await;
    assert_eq!(engine.snapshot().await.len(), 1);

    engine
        .enqueue(&EnqueueRequest::new(watch_url("new"), "New", "General"))
        .await
        .unwrap();

    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    let entries = on_disk["ytm4a_queue"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["id"], json!("1"));
    assert_eq!(entries[0]["folder"], json!("General"));
    assert_eq!(entries[2], unknown);
}
