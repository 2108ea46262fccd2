use std::time::Duration;

use bom_logging::{bom_debug, bom_warn, redact_bearer, redact_url};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use specbom_core::StoredObject;
use url::Url;

use crate::launch::LaunchRequest;
use crate::{DownloadTicket, NewObject, StoreError, UploadTicket};

pub const DEFAULT_BASE_URL: &str = "https://api.vertesia.io/api/v1";

#[derive(Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Sent as a bearer token when set. Leave empty when talking to the relay.
    pub api_key: Option<String>,
    /// `None` keeps the transport default.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

/// Remote object store operations. Every call is attempted exactly once.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn request_upload_url(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<UploadTicket, StoreError>;

    /// Writes raw bytes to a signed storage URL.
    async fn put_bytes(&self, url: &str, mime_type: &str, bytes: Vec<u8>)
        -> Result<(), StoreError>;

    async fn create_object(&self, object: &NewObject) -> Result<StoredObject, StoreError>;

    async fn list_objects(
        &self,
        filter: &[(String, String)],
        limit: usize,
    ) -> Result<Vec<StoredObject>, StoreError>;

    async fn get_object(&self, id: &str) -> Result<StoredObject, StoreError>;

    async fn request_download_url(&self, source: &str) -> Result<DownloadTicket, StoreError>;

    /// Reads the body behind a signed download URL, refusing more than `max_bytes`.
    async fn fetch_bytes(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError>;

    async fn delete_object(&self, id: &str) -> Result<(), StoreError>;
}

/// The asynchronous generation endpoint.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the job id the platform assigned, if it returned one.
    async fn execute_async(&self, request: &LaunchRequest) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(settings: ClientSettings) -> Result<Self, StoreError> {
        let base = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|err| StoreError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(settings.base_url.clone()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| StoreError::Network(err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.settings.api_key.as_deref() {
            Some(key) if !key.is_empty() => request.bearer_auth(key),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = summarize_body(&body).unwrap_or_else(|| status.to_string());
        bom_warn!("Upstream call failed with status {}: {}", status.as_u16(), message);
        Err(StoreError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn request_upload_url(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<UploadTicket, StoreError> {
        let url = self.endpoint(&["objects", "upload-url"])?;
        let body = json!({ "name": name, "mime_type": mime_type });
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn put_bytes(
        &self,
        url: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let target = Url::parse(url).map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        bom_debug!("PUT {} bytes to {}", bytes.len(), redact_url(url));
        // Signed URLs carry their own authorization; never attach the API key.
        let response = self
            .client
            .put(target)
            .header(CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|err| StoreError::UploadTransport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UploadTransport(format!(
                "storage returned status {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    async fn create_object(&self, object: &NewObject) -> Result<StoredObject, StoreError> {
        let url = self.endpoint(&["objects"])?;
        self.send_json(self.client.post(url).json(object)).await
    }

    async fn list_objects(
        &self,
        filter: &[(String, String)],
        limit: usize,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let mut url = self.endpoint(&["objects"])?;
        url.query_pairs_mut()
            .extend_pairs(filter.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .append_pair("limit", &limit.to_string());
        let body: Value = self.send_json(self.client.get(url)).await?;
        match body {
            Value::Array(_) => {
                serde_json::from_value(body).map_err(|err| StoreError::Decode(err.to_string()))
            }
            other => {
                bom_debug!("List response was not an array ({}); treating as empty", kind_of(&other));
                Ok(Vec::new())
            }
        }
    }

    async fn get_object(&self, id: &str) -> Result<StoredObject, StoreError> {
        let url = self.endpoint(&["objects", id])?;
        self.send_json(self.client.get(url)).await
    }

    async fn request_download_url(&self, source: &str) -> Result<DownloadTicket, StoreError> {
        let url = self.endpoint(&["objects", "download-url"])?;
        let body = json!({ "file": source });
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn fetch_bytes(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError> {
        let target = Url::parse(url).map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                message: format!("storage returned {status}"),
            });
        }
        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(StoreError::TooLarge { max_bytes });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(StoreError::TooLarge { max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn delete_object(&self, id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&["objects", id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobExecutor for HttpObjectStore {
    async fn execute_async(&self, request: &LaunchRequest) -> Result<Option<String>, StoreError> {
        let url = self.endpoint(&["execute-async"])?;
        let response = self.send(self.client.post(url).json(request)).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Decode(err.to_string()))?;
        Ok(job_id_from(&body))
    }
}

fn job_id_from(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn summarize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut summary: String = trimmed.chars().take(200).collect();
    if summary.len() < trimmed.len() {
        summary.push('…');
    }
    Some(redact_bearer(&summary))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        return StoreError::Decode(err.to_string());
    }
    StoreError::Network(err.to_string())
}
