use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::project_access::ProjectAccess;
use crate::types::{MergeRequestDetails, MergeRequestState, MergeRequestSummary};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchMrDetailsParams {
    /// GitLab project ID or `namespace/name` path. Defaults to the configured project.
    pub project_id: Option<String>,
    /// Merge request IID. When omitted or 0, all merge requests in `state` are listed.
    pub mr_id: Option<u64>,
    /// State filter for the list form: opened, closed, merged, locked, or all. Defaults to opened.
    pub state: Option<MergeRequestState>,
}

/// Either one merge request with its changes, or a listing without them.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MrDetails {
    Single(Box<MergeRequestDetails>),
    List(Vec<MergeRequestSummary>),
}

pub async fn fetch_mr_details(
    access: &ProjectAccess,
    project: &str,
    mr_id: Option<u64>,
    state: MergeRequestState,
) -> Result<MrDetails> {
    info!(project, ?mr_id, "fetching MR details");
    match requested_iid(mr_id) {
        Some(iid) => Ok(MrDetails::Single(Box::new(
            merge_request_details(access, project, iid).await?,
        ))),
        None => Ok(MrDetails::List(access.list_merge_requests(project, state).await?)),
    }
}

/// GitLab IIDs start at 1, so an IID of 0 means "none given".
pub(crate) fn requested_iid(mr_id: Option<u64>) -> Option<u64> {
    mr_id.filter(|&iid| iid != 0)
}

/// Fetch one merge request and, when it is still open, its file-level changes.
///
/// Closed, merged and locked merge requests come back with no changes.
pub async fn merge_request_details(
    access: &ProjectAccess,
    project: &str,
    iid: u64,
) -> Result<MergeRequestDetails> {
    let project = access.resolve_project(project).await?;
    let summary = access.get_merge_request(&project, iid).await?;
    debug!(title = %summary.title, state = %summary.state, "retrieved MR");

    let changes = if summary.state == MergeRequestState::Opened {
        access.merge_request_changes(&project, iid).await?
    } else {
        Vec::new()
    };

    Ok(MergeRequestDetails { summary, changes })
}
