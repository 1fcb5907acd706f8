//! HTTP client for communicating with spamwatchd.

use crate::errors::ClientError;
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use spamwatch_common::schemas::{
    ActionResponse, ApiInfo, BatchMessageRequest, BatchPredictionResponse,
    FilePredictionResponse, HealthResponse, MessageRequest, PredictionResponse,
    StatisticsResponse,
};
use std::path::Path;
use std::time::Duration;

/// Default daemon address
pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the spamwatchd HTTP API
pub struct SpamwatchClient {
    http: Client,
    base_url: String,
}

impl SpamwatchClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                anyhow::Error::new(ClientError::unreachable(&self.base_url))
            } else {
                anyhow::Error::new(e).context("Request failed")
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, &body).into());
        }

        response
            .json::<T>()
            .await
            .context("Daemon returned an unexpected response")
    }

    pub async fn info(&self) -> Result<ApiInfo> {
        self.send(self.http.get(self.url("/"))).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.send(self.http.get(self.url("/health"))).await
    }

    pub async fn predict(&self, message: &str) -> Result<PredictionResponse> {
        let body = MessageRequest {
            message: message.to_string(),
        };
        self.send(self.http.post(self.url("/predict")).json(&body)).await
    }

    pub async fn predict_batch(&self, messages: Vec<String>) -> Result<BatchPredictionResponse> {
        let body = BatchMessageRequest { messages };
        self.send(self.http.post(self.url("/predict/batch")).json(&body))
            .await
    }

    pub async fn predict_file(&self, path: &Path) -> Result<FilePredictionResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));
        self.send(self.http.post(self.url("/predict/file")).multipart(form))
            .await
    }

    pub async fn statistics(&self) -> Result<StatisticsResponse> {
        self.send(self.http.get(self.url("/statistics"))).await
    }

    pub async fn clear_history(&self) -> Result<ActionResponse> {
        self.send(self.http.delete(self.url("/history"))).await
    }

    pub async fn reload_model(&self) -> Result<ActionResponse> {
        self.send(self.http.put(self.url("/model/reload"))).await
    }
}
