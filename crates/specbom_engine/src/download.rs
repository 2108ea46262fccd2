use std::path::PathBuf;

use bom_logging::{bom_debug, bom_info, redact_url};
use specbom_core::StoredObject;

use crate::filename::safe_download_filename;
use crate::persist::AtomicFileWriter;
use crate::store::ObjectStore;
use crate::StoreError;

/// Looks up an object and asks the store for a signed URL to its content.
pub async fn resolve_download_url(
    store: &dyn ObjectStore,
    id: &str,
) -> Result<(StoredObject, String), StoreError> {
    let object = store.get_object(id).await?;
    if object.content.source.trim().is_empty() {
        return Err(StoreError::MissingContent { id: id.to_string() });
    }
    let ticket = store.request_download_url(&object.content.source).await?;
    bom_debug!("Resolved {} to {}", id, redact_url(&ticket.url));
    Ok((object, ticket.url))
}

/// Fetches an object's bytes and writes them into the writer's directory.
pub async fn download_to(
    store: &dyn ObjectStore,
    writer: &AtomicFileWriter,
    id: &str,
    max_bytes: u64,
) -> Result<PathBuf, StoreError> {
    let (object, url) = resolve_download_url(store, id).await?;
    let bytes = store.fetch_bytes(&url, max_bytes).await?;

    let display = if object.content.name.trim().is_empty() {
        object.name.as_str()
    } else {
        object.content.name.as_str()
    };
    let filename = safe_download_filename(display, &object.id);
    let writer = writer.clone();
    let path = tokio::task::spawn_blocking(move || writer.write_bytes(&filename, &bytes))
        .await
        .map_err(|err| StoreError::Io(err.to_string()))?
        .map_err(|err| StoreError::Io(err.to_string()))?;
    bom_info!("Saved {} to {}", id, path.display());
    Ok(path)
}
