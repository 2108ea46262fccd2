use crate::{ListKind, NotificationLevel, ObjectId, QueueRowView};

pub const EMPTY_CATALOG_PLACEHOLDER: &str = "No catalogue items yet";
pub const EMPTY_BOM_PLACEHOLDER: &str = "No BOMs generated yet";
pub const EMPTY_QUEUE_PLACEHOLDER: &str = "Nothing queued";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub catalog: ListView,
    pub boms: ListView,
    pub queue: QueueView,
    pub selected_specs: Vec<String>,
    pub start_enabled: bool,
    pub processing: bool,
    pub polling: bool,
    pub pending_delete: Option<ObjectId>,
    pub download_links: Vec<DownloadLinkView>,
    pub notifications: Vec<NotificationView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Empty { placeholder: &'static str },
    Rows(Vec<ObjectRowView>),
}

impl Default for ListView {
    fn default() -> Self {
        ListView::Empty {
            placeholder: EMPTY_CATALOG_PLACEHOLDER,
        }
    }
}

impl ListView {
    pub fn rows(&self) -> &[ObjectRowView] {
        match self {
            ListView::Empty { .. } => &[],
            ListView::Rows(rows) => rows,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rows().iter().map(|row| row.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRowView {
    pub id: ObjectId,
    pub name: String,
    pub badge: &'static str,
    pub list: ListKind,
    pub created_on: Option<String>,
    pub actions: [RowAction; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActionKind {
    View,
    Download,
    Delete,
}

impl RowActionKind {
    pub fn label(self) -> &'static str {
        match self {
            RowActionKind::View => "View",
            RowActionKind::Download => "Download",
            RowActionKind::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub kind: RowActionKind,
    pub target: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueView {
    Empty { placeholder: &'static str },
    Rows(Vec<QueueRowView>),
}

impl Default for QueueView {
    fn default() -> Self {
        QueueView::Empty {
            placeholder: EMPTY_QUEUE_PLACEHOLDER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLinkView {
    pub object_id: ObjectId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}
