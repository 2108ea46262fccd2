//! Spec-to-BOM engine: object store client and effect execution.
mod download;
mod engine;
mod filename;
mod launch;
mod persist;
mod store;
mod types;
mod upload;

pub use download::{download_to, resolve_download_url};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::safe_download_filename;
pub use launch::{launch, LaunchRequest, LaunchSettings, RunConfig, DEFAULT_INTERACTION};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use store::{ClientSettings, HttpObjectStore, JobExecutor, ObjectStore, DEFAULT_BASE_URL};
pub use types::{
    DownloadTicket, EngineEvent, LocalFile, NewObject, StoreError, UploadTicket,
    DEFAULT_MIME_TYPE,
};
pub use upload::{mime_for_path, upload};
