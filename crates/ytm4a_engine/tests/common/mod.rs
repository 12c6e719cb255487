#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tokio::sync::Notify;
use ytm4a_core::QueueItem;
use ytm4a_engine::{
    Clock, EngineConfig, ProcessingService, ServiceError, SubmitRequest, SubmitResponse,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ytm4a_logging::initialize_for_tests);
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn watch_url(video: &str) -> String {
    format!("https://www.youtube.com/watch?v={video}")
}

/// Manually advanced clock shared between a test and its engine.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn clock(&self) -> Clock {
        let now = self.now.clone();
        Arc::new(move || *now.lock().unwrap())
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            clock: self.clock(),
            ..EngineConfig::default()
        }
    }
}

/// Replies from a script, then succeeds once the script runs out.
#[derive(Default)]
pub struct ScriptedProcessor {
    replies: Mutex<VecDeque<Result<SubmitResponse, ServiceError>>>,
    requests: Mutex<Vec<SubmitRequest>>,
}

impl ScriptedProcessor {
    pub fn new(replies: Vec<Result<SubmitResponse, ServiceError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SubmitRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProcessingService for ScriptedProcessor {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SubmitResponse::success()))
    }
}

/// Blocks inside `submit` until released, so tests can act mid-run.
#[derive(Default)]
pub struct GatedProcessor {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait::async_trait]
impl ProcessingService for GatedProcessor {
    async fn submit(&self, _request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(SubmitResponse::success())
    }
}

/// A stored item as an earlier session would have left it.
pub fn stored_item(id: &str, video: &str, status: &str, last_updated: Option<DateTime<Utc>>) -> QueueItem {
    let mut value = json!({
        "id": id,
        "url": watch_url(video),
        "title": format!("Video {video}"),
        "folder": "General",
        "ticker_symbol": null,
        "status": status,
        "addedAt": t0().to_rfc3339(),
    });
    if let Some(at) = last_updated {
        value["lastUpdated"] = json!(at.to_rfc3339());
    }
    serde_json::from_value(value).unwrap()
}
