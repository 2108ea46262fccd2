use chrono::{DateTime, Utc};

use crate::view_model::{EMPTY_BOM_PLACEHOLDER, EMPTY_CATALOG_PLACEHOLDER, EMPTY_QUEUE_PLACEHOLDER};
use crate::{
    ListKind, ListView, ObjectRowView, QueueRowView, QueueView, RowAction, RowActionKind,
    StoredObject,
};

/// Maps store records to display rows for one panel.
///
/// BOMs are ordered newest first (undated records last); catalogue rows keep
/// the order the store returned.
pub fn render_list(objects: &[StoredObject], kind: ListKind) -> ListView {
    if objects.is_empty() {
        return ListView::Empty {
            placeholder: placeholder_for(kind),
        };
    }

    let mut ordered: Vec<&StoredObject> = objects.iter().collect();
    if kind == ListKind::Bom {
        // Stable sort keeps upstream order among equal or missing dates.
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    ListView::Rows(ordered.into_iter().map(|obj| row(obj, kind)).collect())
}

pub fn render_queue(rows: Vec<QueueRowView>) -> QueueView {
    if rows.is_empty() {
        QueueView::Empty {
            placeholder: EMPTY_QUEUE_PLACEHOLDER,
        }
    } else {
        QueueView::Rows(rows)
    }
}

pub fn placeholder_for(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Catalog => EMPTY_CATALOG_PLACEHOLDER,
        ListKind::Bom => EMPTY_BOM_PLACEHOLDER,
    }
}

fn row(obj: &StoredObject, kind: ListKind) -> ObjectRowView {
    let name = if obj.name.trim().is_empty() {
        "Unnamed".to_string()
    } else {
        obj.name.clone()
    };
    ObjectRowView {
        id: obj.id.clone(),
        name,
        badge: badge(kind),
        list: kind,
        created_on: obj.created_at.map(format_date),
        actions: [
            RowActionKind::View,
            RowActionKind::Download,
            RowActionKind::Delete,
        ]
        .map(|action| RowAction {
            kind: action,
            target: obj.id.clone(),
        }),
    }
}

fn badge(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Catalog => "Catalog",
        ListKind::Bom => "BOM",
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
