// src/actions/template.rs

//! Placeholder substitution for action messages.
//!
//! Supported placeholders: `{watcher}`, `{file}`, `{reason}`, `{lines}`.
//! `{lines}` renders the changed range (`80-100`) or is empty for
//! structural triggers. Unknown placeholders are left as written.

use super::ActionRequest;

pub fn render(template: &str, request: &ActionRequest<'_>) -> String {
    let lines = request
        .evidence
        .changed
        .map(|r| r.to_string())
        .unwrap_or_default();

    template
        .replace("{watcher}", request.watcher_name)
        .replace("{file}", request.file_path)
        .replace("{reason}", request.evidence.reason.as_str())
        .replace("{lines}", &lines)
}

/// Human-readable description of what changed, used as the body of
/// Slack messages and tickets.
pub fn change_summary(request: &ActionRequest<'_>) -> String {
    match request.evidence.hunk.as_ref() {
        Some(hunk) if !hunk.body.is_empty() => format!(
            "Changed lines in {}:\n\n```\n{}\n```",
            request.file_path, hunk.body
        ),
        _ => format!("{}: {}", request.evidence.reason, request.file_path),
    }
}
