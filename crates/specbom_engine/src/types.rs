use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use specbom_core::{JobKey, ListKind, ObjectContent, ObjectId, StoredObject};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Signed upload slot returned by the store; used once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadTicket {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadTicket {
    pub url: String,
}

/// Body of the object-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewObject {
    pub name: String,
    pub content: ObjectContent,
    pub properties: BTreeMap<String, Value>,
}

/// File bytes plus the metadata the uploader needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn mime_or_default(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("upload to storage failed: {0}")]
    UploadTransport(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("object {id} has no stored content")]
    MissingContent { id: ObjectId },
    #[error("download too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
    #[error("local file error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Completions reported by the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SpecLaunched {
        file_name: String,
        job_id: Option<JobKey>,
        at: DateTime<Utc>,
    },
    SpecFailed {
        file_name: String,
        error: StoreError,
    },
    CatalogItemUploaded {
        file_name: String,
        object: StoredObject,
    },
    CatalogUploadFailed {
        file_name: String,
        error: StoreError,
    },
    ObjectsLoaded {
        list: ListKind,
        result: Result<Vec<StoredObject>, StoreError>,
    },
    DownloadUrlResolved {
        id: ObjectId,
        result: Result<String, StoreError>,
    },
    DownloadSaved {
        id: ObjectId,
        result: Result<PathBuf, StoreError>,
    },
    ObjectDeleted {
        id: ObjectId,
        result: Result<(), StoreError>,
    },
    /// Reconciliation timer fired.
    PollTick,
}
