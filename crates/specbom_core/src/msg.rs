use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{FileSelection, JobKey, ListKind, ObjectId, RowActionKind, StoredObject};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Initial load of both panels.
    AppStarted,
    /// User picked the spec documents for the next generation batch.
    SpecFilesSelected(Vec<FileSelection>),
    /// User clicked Start generation.
    StartGenerationClicked,
    /// User dropped files onto the catalogue panel.
    CatalogFilesSelected(Vec<FileSelection>),
    /// A spec was uploaded and its generation job accepted.
    GenerationLaunched {
        file_name: String,
        job_id: Option<JobKey>,
        at: DateTime<Utc>,
    },
    GenerationFailed {
        file_name: String,
        error: String,
    },
    CatalogItemUploaded {
        file_name: String,
        object: StoredObject,
    },
    CatalogUploadFailed {
        file_name: String,
        error: String,
    },
    /// Authoritative list for one panel arrived.
    ObjectsLoaded {
        list: ListKind,
        objects: Vec<StoredObject>,
    },
    ObjectsLoadFailed {
        list: ListKind,
        error: String,
    },
    ViewRequested {
        id: ObjectId,
    },
    DownloadRequested {
        id: ObjectId,
    },
    DownloadUrlResolved {
        id: ObjectId,
        url: String,
    },
    DownloadSaved {
        id: ObjectId,
        path: PathBuf,
    },
    /// View or download failed.
    ActionFailed {
        id: ObjectId,
        action: RowActionKind,
        error: String,
    },
    DeleteRequested {
        id: ObjectId,
    },
    DeleteConfirmed {
        id: ObjectId,
    },
    /// User declined the confirmation; not an error.
    DeleteDeclined {
        id: ObjectId,
    },
    ObjectDeleted {
        id: ObjectId,
    },
    DeleteFailed {
        id: ObjectId,
        error: String,
    },
    /// Reconciliation timer fired.
    PollTick,
    /// Wall-clock tick driving elapsed times, TTL eviction and toast expiry.
    Tick {
        now: DateTime<Utc>,
    },
    NotificationDismissed {
        id: u64,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
