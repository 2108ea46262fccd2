use std::fmt::Write;

use specbom_core::{
    AppViewModel, DownloadLinkView, ListView, NotificationLevel, NotificationView, QueueView,
};

use crate::cli::ListTarget;

pub fn render_panels(view: &AppViewModel, which: ListTarget) -> String {
    let mut out = String::new();
    if matches!(which, ListTarget::Catalog | ListTarget::All) {
        render_list_into(&mut out, "Catalogue", &view.catalog);
    }
    if matches!(which, ListTarget::Boms | ListTarget::All) {
        render_list_into(&mut out, "Generated BOMs", &view.boms);
    }
    out
}

fn render_list_into(out: &mut String, title: &str, list: &ListView) {
    let _ = writeln!(out, "{title}");
    match list {
        ListView::Empty { placeholder } => {
            let _ = writeln!(out, "  {placeholder}");
        }
        ListView::Rows(rows) => {
            let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
            let name_width = rows
                .iter()
                .map(|r| r.name.chars().count())
                .max()
                .unwrap_or(0);
            for row in rows {
                let date = row.created_on.as_deref().unwrap_or("-");
                let _ = writeln!(
                    out,
                    "  {:<id_width$}  {:<name_width$}  {:<7}  {}",
                    row.id, row.name, row.badge, date
                );
            }
        }
    }
    out.push('\n');
}

pub fn render_queue(queue: &QueueView) -> String {
    let mut out = String::from("Processing queue\n");
    match queue {
        QueueView::Empty { placeholder } => {
            let _ = writeln!(out, "  {placeholder}");
        }
        QueueView::Rows(rows) => {
            for row in rows {
                let _ = writeln!(
                    out,
                    "  {} ({}) started {} min ago",
                    row.display_name, row.job_id, row.elapsed_minutes
                );
            }
        }
    }
    out
}

pub fn notification_line(notification: &NotificationView) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };
    format!("[{tag}] {}", notification.message)
}

pub fn download_link_line(link: &DownloadLinkView) -> String {
    format!("{}: {}", link.object_id, link.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specbom_core::{render_list, ListKind, StoredObject};

    fn bom(id: &str, name: &str, created: &str) -> StoredObject {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "created_at": created,
            "properties": {"kind": "bom"},
        }))
        .unwrap()
    }

    #[test]
    fn renders_placeholders_for_empty_panels() {
        let view = AppViewModel {
            boms: render_list(&[], ListKind::Bom),
            ..AppViewModel::default()
        };
        assert_eq!(
            render_panels(&view, ListTarget::All),
            "Catalogue\n  No catalogue items yet\n\nGenerated BOMs\n  No BOMs generated yet\n\n"
        );
    }

    #[test]
    fn rows_are_aligned_newest_first() {
        let view = AppViewModel {
            boms: render_list(
                &[
                    bom("b1", "old.xlsx", "2024-01-05T00:00:00Z"),
                    bom("b22", "new.xlsx", "2024-02-01T00:00:00Z"),
                ],
                ListKind::Bom,
            ),
            ..AppViewModel::default()
        };
        assert_eq!(
            render_panels(&view, ListTarget::Boms),
            "Generated BOMs\n  b22  new.xlsx  BOM      2024-02-01\n  b1   old.xlsx  BOM      2024-01-05\n\n"
        );
    }

    #[test]
    fn notification_lines_carry_level_tag() {
        let line = notification_line(&NotificationView {
            id: 1,
            level: NotificationLevel::Error,
            message: "Failed to load BOM list: network error".into(),
        });
        assert_eq!(line, "[error] Failed to load BOM list: network error");
    }
}
