use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// A GitLab project as returned by `GET /projects/:id`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: String,
}

/// Lifecycle state of a merge request, as spelled by GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    #[default]
    Opened,
    Closed,
    Merged,
    Locked,
    /// Listing filter only; no merge request is ever in this state.
    All,
}

impl MergeRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeRequestState::Opened => "opened",
            MergeRequestState::Closed => "closed",
            MergeRequestState::Merged => "merged",
            MergeRequestState::Locked => "locked",
            MergeRequestState::All => "all",
        }
    }
}

impl fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeRequestState {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opened" | "open" => Ok(MergeRequestState::Opened),
            "closed" => Ok(MergeRequestState::Closed),
            "merged" => Ok(MergeRequestState::Merged),
            "locked" => Ok(MergeRequestState::Locked),
            "all" => Ok(MergeRequestState::All),
            other => Err(ReportError::Config(format!(
                "unknown merge request state '{other}'; use opened, closed, merged, locked, or all"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Author {
    pub name: String,
    pub username: String,
}

/// Snapshot of a merge request at fetch time.
///
/// `id` is the project-scoped sequence number (GitLab's `iid`), not the
/// instance-wide identifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MergeRequestSummary {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub state: MergeRequestState,
    pub created_at: String,
    pub updated_at: String,
    pub author: Author,
    pub source_branch: String,
    pub target_branch: String,
    pub web_url: String,
}

/// One changed file within a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangeRecord {
    #[serde(default)]
    pub old_path: String,
    pub new_path: String,
    /// Raw unified diff text for this file; empty when GitLab omits an oversized diff
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

/// A merge request summary enriched with its file-level changes.
///
/// `changes` is empty for merge requests that are not `opened`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MergeRequestDetails {
    #[serde(flatten)]
    pub summary: MergeRequestSummary,
    pub changes: Vec<ChangeRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_gitlab_spellings() {
        assert_eq!("opened".parse::<MergeRequestState>().unwrap(), MergeRequestState::Opened);
        assert_eq!("OPEN".parse::<MergeRequestState>().unwrap(), MergeRequestState::Opened);
        assert_eq!("merged".parse::<MergeRequestState>().unwrap(), MergeRequestState::Merged);
        assert!("draft".parse::<MergeRequestState>().is_err());
    }

    #[test]
    fn details_flatten_summary_fields() {
        let details = MergeRequestDetails {
            summary: MergeRequestSummary {
                id: 42,
                title: "Add login".to_string(),
                description: String::new(),
                state: MergeRequestState::Opened,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-02T00:00:00Z".to_string(),
                author: Author {
                    name: "Alice".to_string(),
                    username: "alice".to_string(),
                },
                source_branch: "feature".to_string(),
                target_branch: "main".to_string(),
                web_url: "https://gitlab.example.com/group/repo/-/merge_requests/42".to_string(),
            },
            changes: Vec::new(),
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["state"], "opened");
        assert_eq!(json["author"]["username"], "alice");
        assert!(json["changes"].as_array().unwrap().is_empty());
    }
}
