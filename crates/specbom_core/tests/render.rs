use pretty_assertions::assert_eq;
use serde_json::json;
use specbom_core::{
    render_list, render_queue, JobQueue, ListKind, ListView, QueueView, RowActionKind,
    StoredObject, EMPTY_BOM_PLACEHOLDER, EMPTY_CATALOG_PLACEHOLDER, EMPTY_QUEUE_PLACEHOLDER,
};

fn object(id: &str, name: &str, created_at: Option<&str>, kind: &str) -> StoredObject {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "created_at": created_at,
        "content": { "source": format!("up-{id}"), "type": "application/pdf", "name": name },
        "properties": { "kind": kind },
    }))
    .unwrap()
}

#[test]
fn boms_render_newest_first() {
    let boms = vec![
        object("jan", "jan.xlsx", Some("2024-01-01T00:00:00Z"), "bom"),
        object("mar", "mar.xlsx", Some("2024-03-01T00:00:00Z"), "bom"),
        object("feb", "feb.xlsx", Some("2024-02-01T00:00:00Z"), "bom"),
    ];
    let view = render_list(&boms, ListKind::Bom);
    let dates: Vec<_> = view
        .rows()
        .iter()
        .map(|row| row.created_on.clone().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
}

#[test]
fn undated_boms_sort_last_in_upstream_order() {
    let boms = vec![
        object("u1", "u1", None, "bom"),
        object("d1", "d1", Some("2024-01-01T00:00:00Z"), "bom"),
        object("u2", "u2", None, "bom"),
    ];
    let view = render_list(&boms, ListKind::Bom);
    assert_eq!(view.ids(), vec!["d1", "u1", "u2"]);
}

#[test]
fn catalogue_keeps_upstream_order() {
    let items = vec![
        object("jan", "jan.pdf", Some("2024-01-01T00:00:00Z"), "catalog_item"),
        object("mar", "mar.pdf", Some("2024-03-01T00:00:00Z"), "catalog_item"),
        object("feb", "feb.pdf", Some("2024-02-01T00:00:00Z"), "catalog_item"),
    ];
    let view = render_list(&items, ListKind::Catalog);
    assert_eq!(view.ids(), vec!["jan", "mar", "feb"]);
}

#[test]
fn empty_lists_render_placeholders() {
    assert_eq!(
        render_list(&[], ListKind::Catalog),
        ListView::Empty {
            placeholder: EMPTY_CATALOG_PLACEHOLDER
        }
    );
    assert_eq!(
        render_list(&[], ListKind::Bom),
        ListView::Empty {
            placeholder: EMPTY_BOM_PLACEHOLDER
        }
    );
    assert_eq!(
        render_queue(Vec::new()),
        QueueView::Empty {
            placeholder: EMPTY_QUEUE_PLACEHOLDER
        }
    );
    assert!(!EMPTY_CATALOG_PLACEHOLDER.is_empty());
}

#[test]
fn rows_carry_three_actions_bound_to_id() {
    let items = vec![object("o1", "   ", None, "catalog_item")];
    let view = render_list(&items, ListKind::Catalog);
    let row = &view.rows()[0];
    assert_eq!(row.name, "Unnamed");
    assert_eq!(row.badge, "Catalog");
    assert_eq!(row.created_on, None);
    let kinds: Vec<_> = row.actions.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RowActionKind::View,
            RowActionKind::Download,
            RowActionKind::Delete
        ]
    );
    assert!(row.actions.iter().all(|a| a.target == "o1"));
}

#[test]
fn queue_snapshot_never_reports_negative_elapsed() {
    use chrono::{Duration, TimeZone, Utc};

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let mut queue = JobQueue::new();
    queue.enqueue("A", "a.pdf", start);
    queue.enqueue("B", "b.pdf", start);

    let later = queue.snapshot(start + Duration::seconds(120));
    assert!(later.iter().all(|row| row.elapsed_minutes == 2));

    let earlier = queue.snapshot(start - Duration::seconds(30));
    assert!(earlier.iter().all(|row| row.elapsed_minutes == 0));
}
