use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChangeRecord, MergeRequestState, MergeRequestSummary, Project};

/// The subset of the GitLab REST API this server consumes.
///
/// Project arguments are passed to GitLab verbatim: a numeric ID, a raw
/// `namespace/name` path, or an already percent-encoded path.
#[async_trait]
pub trait GitLabApi: Send + Sync + Debug {
    /// Check the token against the instance. Fails with `ReportError::Auth` when rejected.
    async fn authenticate(&self) -> Result<()>;

    /// Look up a project. Fails with `ReportError::NotFound` when nothing matches.
    async fn get_project(&self, project: &str) -> Result<Project>;

    /// List every merge request of a project in the given state.
    async fn list_merge_requests(
        &self,
        project_id: u64,
        state: MergeRequestState,
    ) -> Result<Vec<MergeRequestSummary>>;

    /// Fetch a single merge request by its project-scoped iid.
    async fn get_merge_request(&self, project_id: u64, iid: u64) -> Result<MergeRequestSummary>;

    /// Fetch the file-level changes of a merge request.
    async fn merge_request_changes(&self, project_id: u64, iid: u64) -> Result<Vec<ChangeRecord>>;
}

/// A page created in the wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPage {
    pub id: String,
    /// Absolute URL of the page in the wiki web UI.
    pub url: String,
}

/// The subset of the Confluence REST API this server consumes.
#[async_trait]
pub trait WikiApi: Send + Sync + Debug {
    /// Find the ID of the page titled `title` in `space`, if it exists.
    async fn get_page_id(&self, space: &str, title: &str) -> Result<Option<String>>;

    /// Create a page whose body is wiki markup, optionally under `parent_id`.
    async fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedPage>;
}
