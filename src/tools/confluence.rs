use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use crate::client::{ConfluenceClient, WikiApi};
use crate::config::ConfluenceConfig;
use crate::error::{ReportError, Result};
use crate::markup;
use crate::project_access::ProjectAccess;
use crate::types::{AnalysisReport, MergeRequestState};

use super::merge_requests::{merge_request_details, requested_iid};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StoreInConfluenceParams {
    /// GitLab project ID or `namespace/name` path. Defaults to the configured project.
    pub project_id: Option<String>,
    /// Merge request IID. When omitted, a summary page of all open merge requests is published.
    pub mr_id: Option<u64>,
    /// Output of `analyze_code_changes` for this merge request. When given, the page
    /// includes the aggregate counts and a per-file table.
    pub analysis: Option<AnalysisReport>,
}

/// Publishing capability: a wiki client bound to the configured space.
#[derive(Debug, Clone)]
pub struct Publisher {
    wiki: Arc<dyn WikiApi>,
    space: String,
}

impl Publisher {
    pub fn new(config: &ConfluenceConfig) -> Result<Self> {
        let client = ConfluenceClient::new(config)?;
        Ok(Self::with_client(Arc::new(client), config.space.clone()))
    }

    pub fn with_client(wiki: Arc<dyn WikiApi>, space: String) -> Self {
        Self { wiki, space }
    }

    /// Create `title` under the reports parent page and return its URL.
    ///
    /// The parent is looked up on every call; a missing parent puts the page
    /// at the space root.
    pub async fn publish(&self, title: &str, body: &str) -> Result<String> {
        let parent_id = self
            .wiki
            .get_page_id(&self.space, markup::PARENT_PAGE_TITLE)
            .await?;
        if parent_id.is_none() {
            warn!(
                space = %self.space,
                parent = markup::PARENT_PAGE_TITLE,
                "parent page not found, creating page at space root"
            );
        }

        let page = self
            .wiki
            .create_page(&self.space, title, body, parent_id.as_deref())
            .await?;
        info!(title, url = %page.url, "created Confluence page");
        Ok(page.url)
    }
}

/// Render and publish one of the three report shapes, returning the page URL.
pub async fn store_in_confluence(
    publisher: Option<&Publisher>,
    access: &ProjectAccess,
    project: &str,
    mr_id: Option<u64>,
    analysis: Option<&AnalysisReport>,
) -> Result<String> {
    let publisher = publisher.ok_or_else(|| {
        ReportError::Config(
            "Confluence integration is not configured; set CONFLUENCE_URL, \
             CONFLUENCE_USERNAME, CONFLUENCE_TOKEN and CONFLUENCE_SPACE"
                .to_string(),
        )
    })?;
    info!(project, ?mr_id, with_analysis = analysis.is_some(), "storing report in Confluence");

    let (title, body) = match requested_iid(mr_id) {
        None => {
            let mrs = access
                .list_merge_requests(project, MergeRequestState::Opened)
                .await?;
            (markup::summary_title(project), markup::render_summary_page(&mrs))
        }
        Some(iid) => {
            let details = merge_request_details(access, project, iid).await?;
            let body = match analysis {
                Some(analysis) => markup::render_analysis_page(&details, analysis),
                None => markup::render_details_page(&details),
            };
            (markup::analysis_title(&details.summary), body)
        }
    };

    publisher.publish(&title, &body).await
}
