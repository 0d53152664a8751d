//! Record service client: the four patient operations plus the activity feed.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{Credentials, PatientDraft, PatientRecord, RecentActivityEntry, SearchQuery},
    error::{RemoteErrorBody, RemoteRejection},
    protocol::{
        ActivityQuery, StatusResponse, LOGIN_PATH, RECENT_ACTIVITY_PATH, REGISTER_PATIENT_PATH,
        SEARCH_PATIENT_PATH, UPDATE_PATIENT_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

#[async_trait]
pub trait RecordService: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials)
        -> Result<StatusResponse, ServiceError>;
    async fn create_patient(&self, draft: &PatientDraft) -> Result<StatusResponse, ServiceError>;
    async fn search_patient(&self, query: &SearchQuery) -> Result<PatientRecord, ServiceError>;
    async fn update_patient(&self, record: &PatientRecord)
        -> Result<StatusResponse, ServiceError>;
    async fn recent_activity(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<RecentActivityEntry>, ServiceError>;
}

pub struct HttpRecordService {
    http: Client,
    base_url: String,
}

impl HttpRecordService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<StatusResponse, ServiceError> {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        debug!(path, status = response.status().as_u16(), "record service replied");
        read_status(response).await
    }
}

/// Validates `raw` as an http(s) URL and strips any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).with_context(|| format!("invalid base url: {trimmed}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("base url must start with http:// or https://"));
    }
    if url.cannot_be_a_base() {
        return Err(anyhow!("base url cannot carry endpoint paths: {trimmed}"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[async_trait]
impl RecordService for HttpRecordService {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<StatusResponse, ServiceError> {
        self.post_json(LOGIN_PATH, credentials).await
    }

    async fn create_patient(&self, draft: &PatientDraft) -> Result<StatusResponse, ServiceError> {
        self.post_json(REGISTER_PATIENT_PATH, draft).await
    }

    async fn search_patient(&self, query: &SearchQuery) -> Result<PatientRecord, ServiceError> {
        let response = self
            .http
            .get(self.endpoint(SEARCH_PATIENT_PATH))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        debug!(status = status.as_u16(), "search_patient replied");
        let bytes = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            let body = parse_error_body(&bytes);
            return Err(ServiceError::NotFound {
                detail: body.text().map(str::to_string),
            });
        }
        if !status.is_success() {
            return Err(rejection(status, &bytes).into());
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| ServiceError::Transport(format!("malformed search response: {err}")))?;
        if let Some(detail) = not_found_indication(&value) {
            return Err(ServiceError::NotFound { detail });
        }
        serde_json::from_value(value)
            .map_err(|err| ServiceError::Transport(format!("malformed patient record: {err}")))
    }

    async fn update_patient(
        &self,
        record: &PatientRecord,
    ) -> Result<StatusResponse, ServiceError> {
        self.post_json(UPDATE_PATIENT_PATH, record).await
    }

    async fn recent_activity(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<RecentActivityEntry>, ServiceError> {
        let response = self
            .http
            .get(self.endpoint(RECENT_ACTIVITY_PATH))
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(rejection(status, &bytes).into());
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| ServiceError::Transport(format!("malformed activity feed: {err}")))
    }
}

async fn read_status(response: Response) -> Result<StatusResponse, ServiceError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(rejection(status, &bytes).into());
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(StatusResponse::default());
    }
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| ServiceError::Transport(format!("malformed response body: {err}")))?;
    Ok(StatusResponse {
        message: value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn parse_error_body(bytes: &[u8]) -> RemoteErrorBody {
    serde_json::from_slice(bytes).unwrap_or_default()
}

fn rejection(status: StatusCode, bytes: &[u8]) -> RemoteRejection {
    let body = parse_error_body(bytes);
    let message = body
        .text()
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    RemoteRejection::new(status.as_u16(), message)
}

/// `null`, or an object carrying `error` but no record fields.
fn not_found_indication(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::Object(map) if map.contains_key("error") && !map.contains_key("first_name") => {
            Some(map.get("error").and_then(Value::as_str).map(str::to_string))
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
