//! Spec-to-BOM core: pure state machine, job queue, reconciler and view-model helpers.
mod effect;
mod msg;
mod notification;
mod object;
mod queue;
mod reconcile;
mod render;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use notification::{Notification, NotificationCenter, NotificationLevel};
pub use object::{
    FileSelection, JobKey, ListKind, ObjectContent, ObjectId, ObjectKind, StoredObject,
    JOB_ID_PROPERTY, KIND_PROPERTY,
};
pub use queue::{elapsed_minutes, placeholder_job_id, JobQueue, QueueEntry, QueueRowView};
pub use reconcile::{PollDecision, PollPolicy, Reconciler, ReconcilerState};
pub use render::{placeholder_for, render_list, render_queue};
pub use state::{AppState, StateSettings};
pub use update::update;
pub use view_model::{
    AppViewModel, DownloadLinkView, ListView, NotificationView, ObjectRowView, QueueView,
    RowAction, RowActionKind, EMPTY_BOM_PLACEHOLDER, EMPTY_CATALOG_PLACEHOLDER,
    EMPTY_QUEUE_PLACEHOLDER,
};
