use std::path::Path;

/// Portable download name: `{stem}--{id}{.ext}`, so two objects sharing a
/// display name never overwrite each other.
pub fn safe_download_filename(name: &str, id: &str) -> String {
    let path = Path::new(name.trim());
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(sanitize_component)
        .filter(|e| !e.is_empty() && e.len() <= 16);

    let stem = sanitize_component(stem);
    let stem = if stem.is_empty() { "download".to_string() } else { stem };
    let id = sanitize_component(id);

    let mut out = if id.is_empty() {
        stem
    } else {
        format!("{stem}--{id}")
    };
    if is_reserved_windows_name(&out) {
        out.push('_');
    }
    if let Some(ext) = ext {
        out.push('.');
        out.push_str(&ext);
    }
    out
}

fn sanitize_component(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let trimmed = compacted.trim_matches(&['_', ' ', '.'][..]);
    trimmed.chars().take(80).collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
