use std::collections::BTreeMap;
use std::path::Path;

use bom_logging::{bom_debug, bom_info, bom_warn};
use serde_json::Value;
use specbom_core::{ObjectContent, StoredObject};

use crate::store::ObjectStore;
use crate::{LocalFile, NewObject, StoreError};

impl LocalFile {
    /// Reads a file from disk, guessing the MIME type from its extension.
    pub async fn read(path: &Path) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| StoreError::Io(format!("{}: {err}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            mime_type: mime_for_path(path).map(str::to_string),
            name,
            bytes,
        })
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(mime)
}

/// Three-step upload: signed URL, raw PUT, object registration.
///
/// Nothing is registered when the PUT fails. A failed registration after a
/// successful PUT leaves the bytes orphaned in storage.
pub async fn upload(
    store: &dyn ObjectStore,
    file: LocalFile,
    properties: BTreeMap<String, Value>,
) -> Result<StoredObject, StoreError> {
    let mime = file.mime_or_default().to_string();
    let ticket = store.request_upload_url(&file.name, &mime).await?;
    bom_debug!("Upload slot {} issued for {}", ticket.id, file.name);

    store.put_bytes(&ticket.url, &mime, file.bytes).await?;

    let object = NewObject {
        name: file.name.clone(),
        content: ObjectContent {
            source: ticket.id.clone(),
            mime_type: mime,
            name: file.name.clone(),
        },
        properties,
    };
    let registered = store.create_object(&object).await;
    match registered {
        Ok(mut created) => {
            if created.content.source.trim().is_empty() {
                // Some registration replies omit `content`; keep what was registered.
                bom_debug!("Registration of {} echoed no content", created.id);
                created.content = object.content;
            }
            bom_info!("Registered {} as object {}", file.name, created.id);
            Ok(created)
        }
        Err(err) => {
            bom_warn!(
                "Upload {} for {} is orphaned: registration failed: {}",
                ticket.id,
                file.name,
                err
            );
            Err(err)
        }
    }
}
