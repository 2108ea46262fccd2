use std::time::Duration;

use crate::{FileSelection, ListKind, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upload a spec document, then launch a generation job for it.
    UploadSpecAndLaunch { file: FileSelection },
    UploadCatalogItem { file: FileSelection },
    LoadObjects { list: ListKind },
    ResolveDownloadUrl { id: ObjectId },
    DownloadObject { id: ObjectId },
    /// Ask the user before deleting; answered with `DeleteConfirmed`/`DeleteDeclined`.
    ConfirmDelete { id: ObjectId },
    DeleteObject { id: ObjectId },
    StartPolling { interval: Duration },
    StopPolling,
}

impl Effect {
    /// True for effects that produce exactly one completion message.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Effect::StartPolling { .. } | Effect::StopPolling)
    }
}
