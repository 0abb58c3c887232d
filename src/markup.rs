//! Confluence wiki-markup rendering for published reports.

use crate::types::{AnalysisReport, ChangeRecord, MergeRequestDetails, MergeRequestSummary};

/// Title of the page every report is nested under.
pub const PARENT_PAGE_TITLE: &str = "PR Analysis Reports";

pub fn summary_title(project: &str) -> String {
    format!("MR Summary - {project}")
}

pub fn analysis_title(mr: &MergeRequestSummary) -> String {
    format!("MR Analysis - {}", mr.title)
}

/// One block per merge request of a project.
pub fn render_summary_page(mrs: &[MergeRequestSummary]) -> String {
    let mut parts = vec!["h2. Merge Requests Summary".to_string()];

    if mrs.is_empty() {
        parts.push("No merge requests found.".to_string());
    }

    for mr in mrs {
        parts.push(format!("h3. {}\n{}", escape(&mr.title), basic_fields(mr, false)));
    }

    parts.join("\n\n") + "\n"
}

/// Basic fields plus the raw changes payload.
pub fn render_details_page(details: &MergeRequestDetails) -> String {
    let parts = [
        "h2. Merge Request Details".to_string(),
        format!("h3. Basic Information\n{}", basic_fields(&details.summary, true)),
        format!("h3. Changes\n{}", code_block(&changes_json(&details.changes))),
    ];
    parts.join("\n\n") + "\n"
}

/// Basic fields plus aggregate counts and a per-file table.
pub fn render_analysis_page(details: &MergeRequestDetails, analysis: &AnalysisReport) -> String {
    let counts = [
        format!("* Total Files Changed: {}", analysis.total_files_changed),
        format!("* Total Additions: {}", analysis.total_additions),
        format!("* Total Deletions: {}", analysis.total_deletions),
    ];

    let file_types = if analysis.file_types.is_empty() {
        "No files changed.".to_string()
    } else {
        analysis
            .file_types
            .iter()
            .map(|(ext, count)| format!("* {}: {count}", escape(ext)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut table = vec!["||File Path||Type||Additions||Deletions||".to_string()];
    table.extend(analysis.files.iter().map(|f| {
        format!(
            "|{}|{}|{}|{}|",
            escape(&f.path),
            escape(&f.file_type),
            f.additions,
            f.deletions
        )
    }));

    let parts = [
        "h2. Merge Request Analysis Report".to_string(),
        format!("h3. Basic Information\n{}", basic_fields(&details.summary, true)),
        format!("h3. Code Analysis\n{}", counts.join("\n")),
        format!("h3. File Types Changed\n{file_types}"),
        format!("h3. Detailed File Changes\n{}", table.join("\n")),
    ];
    parts.join("\n\n") + "\n"
}

fn basic_fields(mr: &MergeRequestSummary, with_title: bool) -> String {
    let mut lines = Vec::new();
    if with_title {
        lines.push(format!("* Title: {}", escape(&mr.title)));
    }
    lines.push(format!("* ID: {}", mr.id));
    lines.push(format!("* State: {}", mr.state));
    lines.push(format!("* Author: {}", escape(&mr.author.name)));
    lines.push(format!("* Source Branch: {}", escape(&mr.source_branch)));
    lines.push(format!("* Target Branch: {}", escape(&mr.target_branch)));
    lines.push(format!("* [View in GitLab|{}]", mr.web_url));
    lines.join("\n")
}

fn changes_json(changes: &[ChangeRecord]) -> String {
    serde_json::to_string_pretty(changes).unwrap_or_else(|_| "[]".to_string())
}

fn code_block(body: &str) -> String {
    format!("{{code}}\n{}\n{{code}}", break_code_macros(body))
}

/// Insert a space after the brace of any `{code` in `body` so it cannot close
/// the enclosing block. Macro names match case-insensitively.
fn break_code_macros(body: &str) -> String {
    let lowered = body.to_ascii_lowercase();
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for (start, _) in lowered.match_indices("{code") {
        out.push_str(&body[last..=start]);
        out.push(' ');
        last = start + 1;
    }
    out.push_str(&body[last..]);
    out
}

/// Neutralize characters that start wiki-markup constructs in inline text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' | '[' | ']' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}
