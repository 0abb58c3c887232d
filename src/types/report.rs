use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over a merge request's changed files.
///
/// Also accepted as tool input, so every field defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct AnalysisReport {
    /// Number of changed files.
    #[serde(default)]
    pub total_files_changed: usize,
    /// Occurrences of each file extension (`unknown` for extensionless files).
    #[serde(default)]
    pub file_types: BTreeMap<String, usize>,
    /// Sum of per-file additions.
    #[serde(default)]
    pub total_additions: usize,
    /// Sum of per-file deletions.
    #[serde(default)]
    pub total_deletions: usize,
    /// Per-file entries in merge request order.
    #[serde(default)]
    pub files: Vec<FileStat>,
}

/// Per-file row of an [`AnalysisReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct FileStat {
    /// New path of the file.
    #[serde(default)]
    pub path: String,
    /// Extension category.
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub additions: usize,
    #[serde(default)]
    pub deletions: usize,
}
