use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bom_logging::{bom_debug, bom_error, bom_info};
use chrono::Utc;
use specbom_core::{FileSelection, ListKind, ObjectId, ObjectKind, StoredObject};
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::download::{download_to, resolve_download_url};
use crate::launch::{launch, LaunchSettings};
use crate::persist::AtomicFileWriter;
use crate::store::{ClientSettings, HttpObjectStore, JobExecutor, ObjectStore};
use crate::upload::upload;
use crate::{EngineEvent, LocalFile, StoreError};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub client: ClientSettings,
    pub launch: LaunchSettings,
    pub output_dir: PathBuf,
    pub catalog_limit: usize,
    pub bom_limit: usize,
    pub max_download_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            launch: LaunchSettings::default(),
            output_dir: PathBuf::from("."),
            catalog_limit: 100,
            bom_limit: 50,
            max_download_bytes: 256 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn limit_for(&self, list: ListKind) -> usize {
        match list {
            ListKind::Catalog => self.catalog_limit,
            ListKind::Bom => self.bom_limit,
        }
    }
}

enum EngineCommand {
    UploadSpec { file: FileSelection },
    UploadCatalog { file: FileSelection },
    LoadObjects { list: ListKind },
    ResolveDownloadUrl { id: ObjectId },
    Download { id: ObjectId },
    Delete { id: ObjectId },
    StartPolling { interval: Duration },
    StopPolling,
}

/// Owns a tokio runtime on a background thread. Commands go in, `EngineEvent`s come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, StoreError> {
        let store = Arc::new(HttpObjectStore::new(config.client.clone())?);
        Self::with_backend(store.clone(), store, config)
    }

    /// Runs against any store/executor pair; used with stubs in tests.
    pub fn with_backend(
        store: Arc<dyn ObjectStore>,
        executor: Arc<dyn JobExecutor>,
        config: EngineConfig,
    ) -> Result<Self, StoreError> {
        let runtime = Runtime::new().map_err(|err| StoreError::Io(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Arc::new(Worker {
            store,
            executor,
            writer: AtomicFileWriter::new(config.output_dir.clone()),
            config,
            event_tx,
        });

        thread::Builder::new()
            .name("specbom-engine".into())
            .spawn(move || run(runtime, cmd_rx, worker))
            .map_err(|err| StoreError::Io(err.to_string()))?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload_spec(&self, file: FileSelection) {
        self.send(EngineCommand::UploadSpec { file });
    }

    pub fn upload_catalog(&self, file: FileSelection) {
        self.send(EngineCommand::UploadCatalog { file });
    }

    pub fn load_objects(&self, list: ListKind) {
        self.send(EngineCommand::LoadObjects { list });
    }

    pub fn resolve_download_url(&self, id: ObjectId) {
        self.send(EngineCommand::ResolveDownloadUrl { id });
    }

    pub fn download(&self, id: ObjectId) {
        self.send(EngineCommand::Download { id });
    }

    pub fn delete(&self, id: ObjectId) {
        self.send(EngineCommand::Delete { id });
    }

    /// Replaces any running timer.
    pub fn start_polling(&self, interval: Duration) {
        self.send(EngineCommand::StartPolling { interval });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            bom_error!("Engine thread is gone; command dropped");
        }
    }
}

fn run(runtime: Runtime, cmd_rx: mpsc::Receiver<EngineCommand>, worker: Arc<Worker>) {
    let mut poll_timer: Option<CancellationToken> = None;
    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::StartPolling { interval } => {
                if let Some(previous) = poll_timer.take() {
                    previous.cancel();
                }
                let token = CancellationToken::new();
                runtime.spawn(poll_loop(
                    interval.max(MIN_POLL_INTERVAL),
                    token.clone(),
                    worker.event_tx.clone(),
                ));
                bom_debug!("Poll timer started ({:?})", interval);
                poll_timer = Some(token);
            }
            EngineCommand::StopPolling => {
                if let Some(token) = poll_timer.take() {
                    token.cancel();
                    bom_debug!("Poll timer stopped");
                }
            }
            other => {
                let worker = worker.clone();
                runtime.spawn(async move { worker.handle(other).await });
            }
        }
    }
    if let Some(token) = poll_timer {
        token.cancel();
    }
}

async fn poll_loop(
    interval: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first poll waits one interval.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if event_tx.send(EngineEvent::PollTick).is_err() {
                    break;
                }
            }
        }
    }
}

struct Worker {
    store: Arc<dyn ObjectStore>,
    executor: Arc<dyn JobExecutor>,
    writer: AtomicFileWriter,
    config: EngineConfig,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    async fn handle(&self, command: EngineCommand) {
        let event = match command {
            EngineCommand::UploadSpec { file } => {
                let file_name = file.name.clone();
                match self.upload_and_launch(&file).await {
                    Ok(job_id) => EngineEvent::SpecLaunched {
                        file_name,
                        job_id,
                        at: Utc::now(),
                    },
                    Err(error) => {
                        bom_error!("Generation for {} failed: {}", file_name, error);
                        EngineEvent::SpecFailed { file_name, error }
                    }
                }
            }
            EngineCommand::UploadCatalog { file } => {
                let file_name = file.name.clone();
                match self.upload_file(&file, ObjectKind::CatalogItem).await {
                    Ok(object) => EngineEvent::CatalogItemUploaded { file_name, object },
                    Err(error) => {
                        bom_error!("Catalogue upload of {} failed: {}", file_name, error);
                        EngineEvent::CatalogUploadFailed { file_name, error }
                    }
                }
            }
            EngineCommand::LoadObjects { list } => {
                let result = self
                    .store
                    .list_objects(&list.filter(), self.config.limit_for(list))
                    .await;
                match &result {
                    Ok(objects) => bom_debug!("Loaded {} {} rows", objects.len(), list.label()),
                    Err(err) => bom_error!("Loading {} failed: {}", list.label(), err),
                }
                EngineEvent::ObjectsLoaded { list, result }
            }
            EngineCommand::ResolveDownloadUrl { id } => {
                let result = resolve_download_url(self.store.as_ref(), &id)
                    .await
                    .map(|(_, url)| url);
                EngineEvent::DownloadUrlResolved { id, result }
            }
            EngineCommand::Download { id } => {
                let result = download_to(
                    self.store.as_ref(),
                    &self.writer,
                    &id,
                    self.config.max_download_bytes,
                )
                .await;
                EngineEvent::DownloadSaved { id, result }
            }
            EngineCommand::Delete { id } => {
                let result = self.store.delete_object(&id).await;
                if result.is_ok() {
                    bom_info!("Deleted object {}", id);
                }
                EngineEvent::ObjectDeleted { id, result }
            }
            EngineCommand::StartPolling { .. } | EngineCommand::StopPolling => return,
        };
        let _ = self.event_tx.send(event);
    }

    async fn upload_file(
        &self,
        file: &FileSelection,
        kind: ObjectKind,
    ) -> Result<StoredObject, StoreError> {
        let local = LocalFile::read(&file.path).await?;
        upload(self.store.as_ref(), local, kind.properties()).await
    }

    async fn upload_and_launch(&self, file: &FileSelection) -> Result<Option<String>, StoreError> {
        let object = self.upload_file(file, ObjectKind::Spec).await?;
        if object.content.source.trim().is_empty() {
            return Err(StoreError::MissingContent { id: object.id });
        }
        launch(
            self.executor.as_ref(),
            &object.content.source,
            &self.config.launch,
        )
        .await
    }
}
