use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use ytm4a_logging::queue_debug;

use crate::{FailureKind, ServiceError, SubmitRequest, SubmitResponse};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5555/process";

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub endpoint: String,
    /// `None` leaves connection setup unbounded.
    pub connect_timeout: Option<Duration>,
    /// `None` waits for the service however long the job takes.
    pub request_timeout: Option<Duration>,
    pub max_response_bytes: u64,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: None,
            request_timeout: None,
            max_response_bytes: 1024 * 1024,
        }
    }
}

/// The remote side that performs the actual work for one item.
#[async_trait::async_trait]
pub trait ProcessingService: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ServiceError>;
}

/// Posts items as JSON to an HTTP endpoint. No retries.
#[derive(Debug, Clone)]
pub struct ReqwestProcessor {
    settings: ProcessorSettings,
}

impl ReqwestProcessor {
    pub fn new(settings: ProcessorSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> ServiceError {
        ServiceError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_response_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl ProcessingService for ReqwestProcessor {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| ServiceError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
        let body = serde_json::to_vec(request)
            .map_err(|err| ServiceError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let client = self.build_client()?;

        queue_debug!("POST {} url={}", endpoint, request.url);
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_response_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_response_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        // The service reports job errors as a JSON body on a 500, so the body
        // takes precedence over the status code.
        match serde_json::from_slice::<SubmitResponse>(&bytes) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ServiceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            )),
            Err(err) => Err(ServiceError::new(
                FailureKind::InvalidResponse,
                err.to_string(),
            )),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
