use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use specbom_core::{FileSelection, ListKind, ObjectKind, StoredObject};
use specbom_engine::{
    DownloadTicket, EngineConfig, EngineEvent, EngineHandle, JobExecutor, LaunchRequest,
    NewObject, ObjectStore, StoreError, UploadTicket,
};
use tempfile::TempDir;

/// In-memory store standing in for the remote platform.
#[derive(Default)]
struct StubStore {
    objects: Mutex<Vec<StoredObject>>,
    launches: Mutex<Vec<LaunchRequest>>,
    /// Answer registrations with only an id, like some platform versions do.
    bare_registration: bool,
}

#[async_trait]
impl ObjectStore for StubStore {
    async fn request_upload_url(&self, name: &str, _: &str) -> Result<UploadTicket, StoreError> {
        Ok(UploadTicket {
            id: format!("up-{name}"),
            url: "https://storage.invalid/slot".into(),
        })
    }

    async fn put_bytes(&self, _: &str, _: &str, _: Vec<u8>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_object(&self, object: &NewObject) -> Result<StoredObject, StoreError> {
        let mut objects = self.objects.lock().unwrap();
        let id = format!("obj-{}", objects.len() + 1);
        let reply = if self.bare_registration {
            json!({ "id": id })
        } else {
            json!({
                "id": id,
                "name": object.name,
                "content": object.content,
                "properties": object.properties,
            })
        };
        let created: StoredObject = serde_json::from_value(reply).unwrap();
        objects.push(created.clone());
        Ok(created)
    }

    async fn list_objects(
        &self,
        filter: &[(String, String)],
        _: usize,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let wanted = filter.first().map(|(_, v)| v.clone());
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| wanted.as_deref() == o.kind().map(ObjectKind::as_str))
            .cloned()
            .collect())
    }

    async fn get_object(&self, id: &str) -> Result<StoredObject, StoreError> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(StoreError::Upstream {
                status: 404,
                message: "not found".into(),
            })
    }

    async fn request_download_url(&self, source: &str) -> Result<DownloadTicket, StoreError> {
        Ok(DownloadTicket {
            url: format!("https://storage.invalid/{source}"),
        })
    }

    async fn fetch_bytes(&self, _: &str, _: u64) -> Result<Vec<u8>, StoreError> {
        Ok(b"bytes".to_vec())
    }

    async fn delete_object(&self, id: &str) -> Result<(), StoreError> {
        self.objects.lock().unwrap().retain(|o| o.id != id);
        Ok(())
    }
}

#[async_trait]
impl JobExecutor for StubStore {
    async fn execute_async(&self, request: &LaunchRequest) -> Result<Option<String>, StoreError> {
        self.launches.lock().unwrap().push(request.clone());
        Ok(Some("run-1".into()))
    }
}

fn engine_with(store: Arc<StubStore>, output: &TempDir) -> EngineHandle {
    let config = EngineConfig {
        output_dir: output.path().to_path_buf(),
        ..EngineConfig::default()
    };
    EngineHandle::with_backend(store.clone(), store, config).unwrap()
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine
        .recv_timeout(Duration::from_secs(5))
        .expect("engine event")
}

#[test]
fn spec_upload_launches_with_uploaded_source() {
    let dir = TempDir::new().unwrap();
    let spec = dir.path().join("pump.pdf");
    std::fs::write(&spec, b"%PDF").unwrap();
    let store = Arc::new(StubStore::default());
    let engine = engine_with(store.clone(), &dir);

    engine.upload_spec(FileSelection::from_path(&spec));
    match next_event(&engine) {
        EngineEvent::SpecLaunched {
            file_name, job_id, ..
        } => {
            assert_eq!(file_name, "pump.pdf");
            assert_eq!(job_id.as_deref(), Some("run-1"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    let launches = store.launches.lock().unwrap();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].file, "up-pump.pdf");
}

#[test]
fn bare_registration_still_launches_with_uploaded_source() {
    let dir = TempDir::new().unwrap();
    let spec = dir.path().join("pump.pdf");
    std::fs::write(&spec, b"%PDF").unwrap();
    let store = Arc::new(StubStore {
        bare_registration: true,
        ..StubStore::default()
    });
    let engine = engine_with(store.clone(), &dir);

    engine.upload_spec(FileSelection::from_path(&spec));
    assert!(matches!(
        next_event(&engine),
        EngineEvent::SpecLaunched { .. }
    ));
    let launches = store.launches.lock().unwrap();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].file, "up-pump.pdf");
}

#[test]
fn unreadable_spec_is_reported_without_launch() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(StubStore::default());
    let engine = engine_with(store.clone(), &dir);

    engine.upload_spec(FileSelection::from_path(dir.path().join("missing.pdf")));
    assert!(matches!(
        next_event(&engine),
        EngineEvent::SpecFailed {
            error: StoreError::Io(_),
            ..
        }
    ));
    assert!(store.launches.lock().unwrap().is_empty());
}

#[test]
fn deleted_object_is_gone_from_next_load() {
    let dir = TempDir::new().unwrap();
    let item = dir.path().join("valve.pdf");
    std::fs::write(&item, b"%PDF").unwrap();
    let store = Arc::new(StubStore::default());
    let engine = engine_with(store, &dir);

    engine.upload_catalog(FileSelection::from_path(&item));
    let id = match next_event(&engine) {
        EngineEvent::CatalogItemUploaded { object, .. } => object.id,
        other => panic!("unexpected event {other:?}"),
    };

    engine.delete(id.clone());
    assert!(matches!(
        next_event(&engine),
        EngineEvent::ObjectDeleted { result: Ok(()), .. }
    ));

    engine.load_objects(ListKind::Catalog);
    match next_event(&engine) {
        EngineEvent::ObjectsLoaded { list, result } => {
            assert_eq!(list, ListKind::Catalog);
            assert!(result.unwrap().iter().all(|o| o.id != id));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn poll_timer_ticks_until_stopped() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(Arc::new(StubStore::default()), &dir);

    engine.start_polling(Duration::from_millis(20));
    assert_eq!(next_event(&engine), EngineEvent::PollTick);
    assert_eq!(next_event(&engine), EngineEvent::PollTick);

    engine.stop_polling();
    // Drain ticks that raced the stop command.
    std::thread::sleep(Duration::from_millis(60));
    while engine.try_recv().is_some() {}

    let quiet_until = Instant::now() + Duration::from_millis(150);
    while Instant::now() < quiet_until {
        assert_eq!(engine.try_recv(), None);
        std::thread::sleep(Duration::from_millis(10));
    }
}
