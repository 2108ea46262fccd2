use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::notification::NotificationCenter;
use crate::queue::{placeholder_job_id, JobQueue, QueueEntry};
use crate::reconcile::{PollPolicy, Reconciler};
use crate::render::{render_list, render_queue};
use crate::view_model::{AppViewModel, DownloadLinkView, NotificationView};
use crate::{
    FileSelection, JobKey, ListKind, NotificationLevel, ObjectId, StoredObject, JOB_ID_PROPERTY,
};

/// Tunables the reducer needs; everything else arrives through messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSettings {
    pub poll: PollPolicy,
    pub queue_ttl: Duration,
    pub notification_lifetime: Duration,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            queue_ttl: Duration::minutes(60),
            notification_lifetime: Duration::seconds(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct BatchProgress {
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn begin(&mut self, count: usize) {
        self.in_flight += count;
    }

    /// Records one completion; returns the finished batch once nothing is in flight.
    pub fn complete(&mut self, ok: bool) -> Option<BatchProgress> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if self.in_flight == 0 {
            Some(std::mem::take(self))
        } else {
            None
        }
    }
}

/// Whole application state owned by the message loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    settings: StateSettings,
    selected_specs: Vec<FileSelection>,
    pub(crate) launches: BatchProgress,
    pub(crate) catalog_uploads: BatchProgress,
    queue: JobQueue,
    pub(crate) reconciler: Reconciler,
    catalog: Vec<StoredObject>,
    boms: Vec<StoredObject>,
    known_boms: BTreeSet<ObjectId>,
    boms_seeded: bool,
    pending_delete: Option<ObjectId>,
    download_links: Vec<DownloadLinkView>,
    notifications: NotificationCenter,
    clock: Option<DateTime<Utc>>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(StateSettings::default())
    }

    pub fn with_settings(settings: StateSettings) -> Self {
        Self {
            reconciler: Reconciler::new(settings.poll),
            notifications: NotificationCenter::new(settings.notification_lifetime),
            settings,
            selected_specs: Vec::new(),
            launches: BatchProgress::default(),
            catalog_uploads: BatchProgress::default(),
            queue: JobQueue::new(),
            catalog: Vec::new(),
            boms: Vec::new(),
            known_boms: BTreeSet::new(),
            boms_seeded: false,
            pending_delete: None,
            download_links: Vec::new(),
            clock: None,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &StateSettings {
        &self.settings
    }

    pub fn view(&self) -> AppViewModel {
        let now = self.clock.unwrap_or(DateTime::UNIX_EPOCH);
        AppViewModel {
            catalog: render_list(&self.catalog, ListKind::Catalog),
            boms: render_list(&self.boms, ListKind::Bom),
            queue: render_queue(self.queue.snapshot(now)),
            selected_specs: self.selected_specs.iter().map(|f| f.name.clone()).collect(),
            start_enabled: !self.selected_specs.is_empty() && !self.is_processing(),
            processing: self.is_processing(),
            polling: self.is_polling(),
            pending_delete: self.pending_delete.clone(),
            download_links: self.download_links.clone(),
            notifications: self
                .notifications
                .active()
                .iter()
                .map(|n| NotificationView {
                    id: n.id,
                    level: n.level,
                    message: n.message.clone(),
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn is_processing(&self) -> bool {
        self.launches.in_flight > 0
    }

    pub fn is_polling(&self) -> bool {
        self.reconciler.is_polling()
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(level, message);
        self.mark_dirty();
    }

    pub(crate) fn dismiss_notification(&mut self, id: u64) {
        if self.notifications.dismiss(id) {
            self.mark_dirty();
        }
    }

    pub(crate) fn select_specs(&mut self, files: Vec<FileSelection>) {
        self.selected_specs = files;
        self.mark_dirty();
    }

    pub(crate) fn take_selected_specs(&mut self) -> Vec<FileSelection> {
        self.mark_dirty();
        std::mem::take(&mut self.selected_specs)
    }

    pub(crate) fn has_selected_specs(&self) -> bool {
        !self.selected_specs.is_empty()
    }

    /// Adds a launched job, synthesizing a key when the platform gave none
    /// (or gave one already in use). Returns the key actually used.
    pub(crate) fn enqueue_job(
        &mut self,
        job_id: Option<JobKey>,
        display_name: &str,
        at: DateTime<Utc>,
    ) -> JobKey {
        self.advance_clock(at);
        let key = job_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && !self.queue.contains(id))
            .unwrap_or_else(|| placeholder_job_id(&self.queue, at));
        self.queue.enqueue(key.clone(), display_name, at);
        self.mark_dirty();
        key
    }

    pub(crate) fn replace_list(&mut self, list: ListKind, objects: Vec<StoredObject>) {
        match list {
            ListKind::Catalog => self.catalog = objects,
            ListKind::Bom => self.boms = objects,
        }
        self.mark_dirty();
    }

    /// Matches BOMs not seen before against queued jobs and resolves them.
    ///
    /// The first successful listing only seeds the known set, except for BOMs
    /// that name a queued job or are dated after a queued job started.
    pub(crate) fn reconcile_boms(&mut self) -> Vec<(QueueEntry, StoredObject)> {
        let seeding = !self.boms_seeded;
        self.boms_seeded = true;

        let mut fresh: Vec<&StoredObject> = self
            .boms
            .iter()
            .filter(|b| seeding || !self.known_boms.contains(&b.id))
            .collect();
        fresh.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut resolved = Vec::new();
        for bom in fresh {
            if self.queue.is_empty() {
                break;
            }
            let by_job = bom
                .property_str(JOB_ID_PROPERTY)
                .and_then(|job_id| self.queue.resolve(job_id));
            let entry = by_job.or_else(|| match bom.created_at {
                Some(created) => self.queue.resolve_oldest_started_by(Some(created)),
                None if !seeding => self.queue.resolve_oldest_started_by(None),
                None => None,
            });
            if let Some(entry) = entry {
                resolved.push((entry, bom.clone()));
            }
        }
        self.known_boms = self.boms.iter().map(|b| b.id.clone()).collect();
        if !resolved.is_empty() {
            self.mark_dirty();
        }
        resolved
    }

    /// Applies a wall-clock tick: expires toasts, evicts stale jobs and
    /// re-renders when a displayed minute rolls over.
    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> Vec<QueueEntry> {
        let previous = self.clock;
        self.advance_clock(now);
        if self.notifications.expire(now) {
            self.mark_dirty();
        }
        let evicted = self.queue.evict_expired(now, self.settings.queue_ttl);
        if !evicted.is_empty() {
            self.mark_dirty();
        }
        if let Some(previous) = previous {
            if self.queue.snapshot(previous) != self.queue.snapshot(now) {
                self.mark_dirty();
            }
        }
        evicted
    }

    pub(crate) fn request_delete(&mut self, id: ObjectId) {
        self.pending_delete = Some(id);
        self.mark_dirty();
    }

    /// Clears the pending confirmation if it belongs to `id`.
    pub(crate) fn settle_delete(&mut self, id: &str) -> bool {
        if self.pending_delete.as_deref() == Some(id) {
            self.pending_delete = None;
            self.mark_dirty();
            true
        } else {
            false
        }
    }

    pub(crate) fn record_download_link(&mut self, object_id: ObjectId, url: String) {
        self.download_links.retain(|link| link.object_id != object_id);
        self.download_links.push(DownloadLinkView { object_id, url });
        self.mark_dirty();
    }

    fn advance_clock(&mut self, now: DateTime<Utc>) {
        self.clock = Some(self.clock.map_or(now, |prev| prev.max(now)));
    }
}
