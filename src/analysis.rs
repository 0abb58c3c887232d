use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;
use crate::types::{AnalysisReport, ChangeRecord, FileStat};

/// How additions and deletions are counted from a file's diff text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffCounting {
    /// Count every `+` and `-` character in the diff. Overcounts when the code
    /// itself contains those characters, but matches the historical reports.
    #[default]
    Characters,
    /// Count lines starting with `+`/`-`, skipping the `+++`/`---` file headers.
    Lines,
}

impl fmt::Display for DiffCounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffCounting::Characters => f.write_str("characters"),
            DiffCounting::Lines => f.write_str("lines"),
        }
    }
}

impl FromStr for DiffCounting {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "characters" | "chars" => Ok(DiffCounting::Characters),
            "lines" => Ok(DiffCounting::Lines),
            other => Err(ReportError::Config(format!(
                "DIFF_STATS_MODE={other} is not recognized. Use 'characters' or 'lines'."
            ))),
        }
    }
}

impl DiffCounting {
    /// Returns `(additions, deletions)` for one diff.
    pub fn count(&self, diff: &str) -> (usize, usize) {
        match self {
            DiffCounting::Characters => (
                diff.chars().filter(|&c| c == '+').count(),
                diff.chars().filter(|&c| c == '-').count(),
            ),
            DiffCounting::Lines => diff.lines().fold((0, 0), |(add, del), line| {
                if line.starts_with('+') && !line.starts_with("+++") {
                    (add + 1, del)
                } else if line.starts_with('-') && !line.starts_with("---") {
                    (add, del + 1)
                } else {
                    (add, del)
                }
            }),
        }
    }
}

/// Extension category of a path, taken from its final component.
///
/// A trailing `.` yields an empty category; only a name with no `.` is `"unknown"`.
pub fn file_type(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => "unknown".to_string(),
    }
}

/// Aggregate a merge request's changes into a report.
pub fn analyze(changes: &[ChangeRecord], counting: DiffCounting) -> AnalysisReport {
    let mut report = AnalysisReport {
        total_files_changed: changes.len(),
        ..AnalysisReport::default()
    };

    for change in changes {
        let file_type = file_type(&change.new_path);
        let (additions, deletions) = counting.count(&change.diff);

        *report.file_types.entry(file_type.clone()).or_insert(0) += 1;
        report.total_additions += additions;
        report.total_deletions += deletions;
        report.files.push(FileStat {
            path: change.new_path.clone(),
            file_type,
            additions,
            deletions,
        });
    }

    report
}
