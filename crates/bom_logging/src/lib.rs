#![deny(missing_docs)]
//! Shared logging utilities for the Spec-to-BOM workspace.
//!
//! This crate provides the `bom_*` logging macros used across the codebase,
//! redaction helpers for values that must never reach a log file, and a
//! minimal test initializer for the global logger.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! bom_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! bom_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! bom_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! bom_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! bom_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Strips the query string and fragment from a URL before logging it.
///
/// Signed storage URLs carry their authorization in the query string, so only
/// scheme, host and path are kept. Unparseable input is replaced entirely.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            let had_query = parsed.query().is_some();
            parsed.set_query(None);
            parsed.set_fragment(None);
            if had_query {
                format!("{parsed}?<redacted>")
            } else {
                parsed.to_string()
            }
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}

/// Replaces any `Bearer <token>` occurrence in `message` with a placeholder.
pub fn redact_bearer(message: &str) -> String {
    const MARKER: &str = "bearer ";
    let lower = message.to_ascii_lowercase();
    let mut out = String::with_capacity(message.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(MARKER) {
        let start = cursor + found + MARKER.len();
        out.push_str(&message[cursor..start]);
        out.push_str("<redacted>");
        let end = message[start..]
            .find(char::is_whitespace)
            .map(|offset| start + offset)
            .unwrap_or(message.len());
        cursor = end;
    }
    out.push_str(&message[cursor..]);
    out
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_query_is_removed() {
        let redacted = redact_url("https://storage.example.com/bucket/file.pdf?X-Sig=abc&exp=1");
        assert_eq!(
            redacted,
            "https://storage.example.com/bucket/file.pdf?<redacted>"
        );
    }

    #[test]
    fn plain_url_is_unchanged() {
        assert_eq!(
            redact_url("https://api.example.com/objects"),
            "https://api.example.com/objects"
        );
        assert_eq!(redact_url("not a url"), "<unparseable url>");
    }

    #[test]
    fn bearer_tokens_are_masked() {
        let masked = redact_bearer("Authorization: Bearer sk-123 rejected; bearer xyz");
        assert_eq!(
            masked,
            "Authorization: Bearer <redacted> rejected; bearer <redacted>"
        );
        assert_eq!(redact_bearer("nothing here"), "nothing here");
    }
}
