use crate::reconcile::PollDecision;
use crate::{AppState, Effect, ListKind, Msg, NotificationLevel, RowActionKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => vec![
            Effect::LoadObjects {
                list: ListKind::Catalog,
            },
            Effect::LoadObjects {
                list: ListKind::Bom,
            },
        ],
        Msg::SpecFilesSelected(files) => {
            let count = files.len();
            state.select_specs(files);
            if count > 0 {
                state.notify(
                    NotificationLevel::Success,
                    format!("{count} spec file{} selected", plural(count)),
                );
            }
            Vec::new()
        }
        Msg::StartGenerationClicked => {
            if !state.has_selected_specs() || state.is_processing() {
                return (state, Vec::new());
            }
            let files = state.take_selected_specs();
            state.launches.begin(files.len());
            files
                .into_iter()
                .map(|file| Effect::UploadSpecAndLaunch { file })
                .collect()
        }
        Msg::GenerationLaunched {
            file_name,
            job_id,
            at,
        } => {
            state.enqueue_job(job_id, &file_name, at);
            let mut effects = Vec::new();
            if state.reconciler.start() {
                effects.push(Effect::StartPolling {
                    interval: state.reconciler.policy().interval,
                });
            }
            finish_launch(&mut state, true);
            effects
        }
        Msg::GenerationFailed { file_name, error } => {
            state.notify(
                NotificationLevel::Error,
                format!("Failed to start generation for {file_name}: {error}"),
            );
            finish_launch(&mut state, false);
            Vec::new()
        }
        Msg::CatalogFilesSelected(files) => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            state.catalog_uploads.begin(files.len());
            state.mark_dirty();
            files
                .into_iter()
                .map(|file| Effect::UploadCatalogItem { file })
                .collect()
        }
        Msg::CatalogItemUploaded { .. } => finish_catalog_upload(&mut state, true),
        Msg::CatalogUploadFailed { file_name, error } => {
            state.notify(
                NotificationLevel::Error,
                format!("Failed to upload {file_name} to catalogue: {error}"),
            );
            finish_catalog_upload(&mut state, false)
        }
        Msg::ObjectsLoaded { list, objects } => {
            state.replace_list(list, objects);
            if list != ListKind::Bom {
                return (state, Vec::new());
            }
            let from_poll = state.reconciler.take_poll_reload();
            let resolved = state.reconcile_boms();
            for (entry, bom) in &resolved {
                state.notify(
                    NotificationLevel::Success,
                    format!("BOM ready for {}: {}", entry.display_name, bom.name),
                );
            }
            // Reloads caused by other actions may resolve jobs but never count as idle.
            if from_poll || !resolved.is_empty() {
                after_reconcile(&mut state, resolved.len())
            } else {
                Vec::new()
            }
        }
        Msg::ObjectsLoadFailed { list, error } => {
            state.notify(
                NotificationLevel::Error,
                format!("Failed to load {}: {error}", list.label()),
            );
            if list == ListKind::Bom && state.reconciler.take_poll_reload() {
                after_reconcile(&mut state, 0)
            } else {
                Vec::new()
            }
        }
        Msg::ViewRequested { id } => vec![Effect::ResolveDownloadUrl { id }],
        Msg::DownloadRequested { id } => vec![Effect::DownloadObject { id }],
        Msg::DownloadUrlResolved { id, url } => {
            state.record_download_link(id, url);
            Vec::new()
        }
        Msg::DownloadSaved { path, .. } => {
            state.notify(
                NotificationLevel::Success,
                format!("Saved {}", path.display()),
            );
            Vec::new()
        }
        Msg::ActionFailed { id, action, error } => {
            let verb = match action {
                RowActionKind::View => "view",
                RowActionKind::Download => "download",
                RowActionKind::Delete => "delete",
            };
            state.notify(
                NotificationLevel::Error,
                format!("Failed to {verb} item {id}: {error}"),
            );
            Vec::new()
        }
        Msg::DeleteRequested { id } => {
            state.request_delete(id.clone());
            vec![Effect::ConfirmDelete { id }]
        }
        Msg::DeleteConfirmed { id } => {
            if state.settle_delete(&id) {
                vec![Effect::DeleteObject { id }]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteDeclined { id } => {
            state.settle_delete(&id);
            Vec::new()
        }
        Msg::ObjectDeleted { .. } => {
            state.notify(NotificationLevel::Success, "Item deleted successfully");
            vec![
                Effect::LoadObjects {
                    list: ListKind::Catalog,
                },
                Effect::LoadObjects {
                    list: ListKind::Bom,
                },
            ]
        }
        Msg::DeleteFailed { id, error } => {
            state.notify(
                NotificationLevel::Error,
                format!("Failed to delete item {id}: {error}"),
            );
            Vec::new()
        }
        Msg::PollTick => {
            // Elapsed times move on every tick even when nothing reloads.
            state.mark_dirty();
            let queue_empty = state.queue().is_empty();
            match state.reconciler.on_tick(queue_empty) {
                PollDecision::Reload => vec![Effect::LoadObjects {
                    list: ListKind::Bom,
                }],
                PollDecision::Stop => vec![Effect::StopPolling],
                PollDecision::Continue | PollDecision::Ignore => Vec::new(),
            }
        }
        Msg::Tick { now } => {
            let ttl_minutes = state.settings().queue_ttl.num_minutes();
            for entry in state.tick(now) {
                state.notify(
                    NotificationLevel::Info,
                    format!(
                        "Stopped tracking {} after {ttl_minutes} minutes without a result",
                        entry.display_name
                    ),
                );
            }
            Vec::new()
        }
        Msg::NotificationDismissed { id } => {
            state.dismiss_notification(id);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn finish_launch(state: &mut AppState, ok: bool) {
    state.mark_dirty();
    if let Some(batch) = state.launches.complete(ok) {
        if batch.succeeded > 0 {
            state.notify(
                NotificationLevel::Success,
                format!(
                    "Started generation for {} file{}",
                    batch.succeeded,
                    plural(batch.succeeded)
                ),
            );
        }
    }
}

fn finish_catalog_upload(state: &mut AppState, ok: bool) -> Vec<Effect> {
    state.mark_dirty();
    match state.catalog_uploads.complete(ok) {
        Some(batch) if batch.succeeded > 0 => {
            state.notify(
                NotificationLevel::Success,
                format!(
                    "{} file{} uploaded to catalogue",
                    batch.succeeded,
                    plural(batch.succeeded)
                ),
            );
            vec![Effect::LoadObjects {
                list: ListKind::Catalog,
            }]
        }
        _ => Vec::new(),
    }
}

fn after_reconcile(state: &mut AppState, resolved: usize) -> Vec<Effect> {
    let queue_empty = state.queue().is_empty();
    match state.reconciler.on_reconciled(resolved, queue_empty) {
        PollDecision::Stop => vec![Effect::StopPolling],
        _ => Vec::new(),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
