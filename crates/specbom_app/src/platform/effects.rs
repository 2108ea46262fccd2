use std::time::Duration;

use bom_logging::{bom_debug, bom_info, bom_warn};
use specbom_core::{Effect, Msg, RowActionKind};
use specbom_engine::{EngineEvent, EngineHandle};

use super::ui::prompt::Confirm;

/// A message coming back from outside the reducer.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    /// Completion of an effect that expected a reply.
    Reply(Msg),
    /// Timer-driven message; settles nothing.
    Timer(Msg),
}

pub struct EffectRunner {
    engine: EngineHandle,
    confirm: Box<dyn Confirm>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, confirm: Box<dyn Confirm>) -> Self {
        Self { engine, confirm }
    }

    /// Hands effects to the engine. Replies that are known immediately
    /// (delete confirmations) are returned; the rest arrive via `next_inbound`.
    /// Returns `(pending_replies, immediate_replies)`.
    pub fn run(&mut self, effects: Vec<Effect>) -> (usize, Vec<Msg>) {
        let mut pending = 0;
        let mut immediate = Vec::new();
        for effect in effects {
            let expects_reply = effect.expects_reply();
            match effect {
                Effect::UploadSpecAndLaunch { file } => {
                    bom_info!("Uploading spec {}", file.name);
                    self.engine.upload_spec(file);
                }
                Effect::UploadCatalogItem { file } => {
                    bom_info!("Uploading catalogue item {}", file.name);
                    self.engine.upload_catalog(file);
                }
                Effect::LoadObjects { list } => self.engine.load_objects(list),
                Effect::ResolveDownloadUrl { id } => self.engine.resolve_download_url(id),
                Effect::DownloadObject { id } => self.engine.download(id),
                Effect::ConfirmDelete { id } => {
                    let question = format!("Delete item {id}? This cannot be undone.");
                    let msg = if self.confirm.confirm(&question) {
                        Msg::DeleteConfirmed { id }
                    } else {
                        Msg::DeleteDeclined { id }
                    };
                    immediate.push(msg);
                    continue;
                }
                Effect::DeleteObject { id } => self.engine.delete(id),
                Effect::StartPolling { interval } => self.engine.start_polling(interval),
                Effect::StopPolling => self.engine.stop_polling(),
            }
            if expects_reply {
                pending += 1;
            }
        }
        (pending, immediate)
    }

    pub fn next_inbound(&self, timeout: Duration) -> Option<Inbound> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Inbound {
    let msg = match event {
        EngineEvent::PollTick => return Inbound::Timer(Msg::PollTick),
        EngineEvent::SpecLaunched {
            file_name,
            job_id,
            at,
        } => Msg::GenerationLaunched {
            file_name,
            job_id,
            at,
        },
        EngineEvent::SpecFailed { file_name, error } => Msg::GenerationFailed {
            file_name,
            error: error.to_string(),
        },
        EngineEvent::CatalogItemUploaded { file_name, object } => {
            Msg::CatalogItemUploaded { file_name, object }
        }
        EngineEvent::CatalogUploadFailed { file_name, error } => Msg::CatalogUploadFailed {
            file_name,
            error: error.to_string(),
        },
        EngineEvent::ObjectsLoaded { list, result } => match result {
            Ok(objects) => Msg::ObjectsLoaded { list, objects },
            Err(error) => Msg::ObjectsLoadFailed {
                list,
                error: error.to_string(),
            },
        },
        EngineEvent::DownloadUrlResolved { id, result } => match result {
            Ok(url) => Msg::DownloadUrlResolved { id, url },
            Err(error) => action_failed(id, RowActionKind::View, error.to_string()),
        },
        EngineEvent::DownloadSaved { id, result } => match result {
            Ok(path) => Msg::DownloadSaved { id, path },
            Err(error) => action_failed(id, RowActionKind::Download, error.to_string()),
        },
        EngineEvent::ObjectDeleted { id, result } => match result {
            Ok(()) => Msg::ObjectDeleted { id },
            Err(error) => {
                bom_warn!("Delete of {} failed: {}", id, error);
                Msg::DeleteFailed {
                    id,
                    error: error.to_string(),
                }
            }
        },
    };
    Inbound::Reply(msg)
}

fn action_failed(id: String, action: RowActionKind, error: String) -> Msg {
    bom_debug!("{} of {} failed: {}", action.label(), id, error);
    Msg::ActionFailed { id, action, error }
}
