use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info};

use crate::analysis::{analyze, DiffCounting};
use crate::error::Result;
use crate::project_access::ProjectAccess;
use crate::types::AnalysisReport;

use super::merge_requests::merge_request_details;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeCodeChangesParams {
    /// GitLab project ID or `namespace/name` path. Defaults to the configured project.
    pub project_id: Option<String>,
    /// Merge request IID.
    pub mr_id: u64,
}

/// Summarize the changes of one merge request.
///
/// Trusts the state in the fetched record: a merge request that is no longer
/// open has no changes and yields an all-zero report.
pub async fn analyze_code_changes(
    access: &ProjectAccess,
    project: &str,
    iid: u64,
    counting: DiffCounting,
) -> Result<AnalysisReport> {
    info!(project, iid, %counting, "analyzing code changes");
    let details = merge_request_details(access, project, iid).await?;
    let report = analyze(&details.changes, counting);
    debug!(
        files = report.total_files_changed,
        additions = report.total_additions,
        deletions = report.total_deletions,
        "analysis completed"
    );
    Ok(report)
}
