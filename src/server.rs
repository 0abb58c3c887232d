use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use tracing::{error, info};

use crate::analysis::DiffCounting;
use crate::config::Config;
use crate::error::ReportError;
use crate::project_access::ProjectAccess;
use crate::response;
use crate::tools::analysis::AnalyzeCodeChangesParams;
use crate::tools::confluence::{Publisher, StoreInConfluenceParams};
use crate::tools::merge_requests::FetchMrDetailsParams;
use crate::tools::project_or_default;

/// The MR analysis server. Holds the GitLab facade, the optional Confluence
/// publisher, and routes the three tools.
#[derive(Debug, Clone)]
pub struct MrReportServer {
    access: ProjectAccess,
    publisher: Option<Publisher>,
    default_project: String,
    diff_counting: DiffCounting,
    tool_router: ToolRouter<Self>,
}

/// Log a tool failure and convert it for the MCP runtime.
fn map_err(
    tool: &str,
    r: crate::error::Result<CallToolResult>,
) -> Result<CallToolResult, ErrorData> {
    r.map_err(|e| {
        error!(tool, error = %e, "tool call failed");
        ErrorData::from(e)
    })
}

#[tool_router]
impl MrReportServer {
    /// Authenticate against GitLab and set up publishing if Confluence is configured.
    pub async fn new(config: &Config) -> std::result::Result<Self, ReportError> {
        let access = ProjectAccess::connect(&config.gitlab).await?;
        let publisher = match &config.confluence {
            Some(wiki) => {
                info!(space = %wiki.space, "Confluence publishing enabled");
                Some(Publisher::new(wiki)?)
            }
            None => None,
        };
        Ok(Self::from_parts(
            access,
            publisher,
            config.gitlab.project_id.clone(),
            config.diff_counting,
        ))
    }

    /// Assemble a server from already-built components.
    pub fn from_parts(
        access: ProjectAccess,
        publisher: Option<Publisher>,
        default_project: String,
        diff_counting: DiffCounting,
    ) -> Self {
        Self {
            access,
            publisher,
            default_project,
            diff_counting,
            tool_router: Self::tool_router(),
        }
    }

    pub fn publishing_enabled(&self) -> bool {
        self.publisher.is_some()
    }

    #[tool(description = "Use this when you need details of a GitLab merge request. With mr_id, returns that merge request plus its file changes (changes are only fetched for opened merge requests). Without mr_id, lists the project's merge requests filtered by state (default opened).")]
    async fn fetch_mr_details(&self, Parameters(p): Parameters<FetchMrDetailsParams>) -> Result<CallToolResult, ErrorData> {
        let project = project_or_default(&p.project_id, &self.default_project);
        let result = crate::tools::merge_requests::fetch_mr_details(
            &self.access,
            project,
            p.mr_id,
            p.state.unwrap_or_default(),
        )
        .await;
        map_err("fetch_mr_details", result.and_then(|d| response::json_result(&d)))
    }

    #[tool(description = "Use this when you need statistics for a merge request's changes: files changed, counts per file extension, total additions and deletions, and a per-file breakdown. Merge requests that are not opened yield an all-zero report.")]
    async fn analyze_code_changes(&self, Parameters(p): Parameters<AnalyzeCodeChangesParams>) -> Result<CallToolResult, ErrorData> {
        let project = project_or_default(&p.project_id, &self.default_project);
        let result = crate::tools::analysis::analyze_code_changes(
            &self.access,
            project,
            p.mr_id,
            self.diff_counting,
        )
        .await;
        map_err("analyze_code_changes", result.and_then(|r| response::json_result(&r)))
    }

    #[tool(description = "Use this when you need to publish a merge request report to Confluence under the 'PR Analysis Reports' page. Without mr_id, publishes a summary of all opened merge requests. With mr_id, publishes that merge request's details, and with analysis (the output of analyze_code_changes) a full analysis table. Returns the page URL.")]
    async fn store_in_confluence(&self, Parameters(p): Parameters<StoreInConfluenceParams>) -> Result<CallToolResult, ErrorData> {
        let project = project_or_default(&p.project_id, &self.default_project);
        let result = crate::tools::confluence::store_in_confluence(
            self.publisher.as_ref(),
            &self.access,
            project,
            p.mr_id,
            p.analysis.as_ref(),
        )
        .await;
        map_err("store_in_confluence", result.map(response::text_result))
    }
}

#[tool_handler]
impl ServerHandler for MrReportServer {
    fn get_info(&self) -> ServerInfo {
        let publishing = if self.publishing_enabled() {
            "store_in_confluence publishes reports to Confluence."
        } else {
            "Confluence is not configured, so store_in_confluence will fail."
        };
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mr-confluence-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "GitLab merge request analysis server. Tools: fetch_mr_details, \
                 analyze_code_changes, store_in_confluence. project_id defaults to '{}'. \
                 Additions/deletions are counted by {} ('characters' counts every +/- \
                 character in the diff, 'lines' counts changed lines). {publishing}",
                self.default_project, self.diff_counting
            )),
        }
    }
}
