use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::GitLabConfig;
use crate::error::{ReportError, Result};
use crate::types::{Author, ChangeRecord, MergeRequestState, MergeRequestSummary, Project};

use super::{check_status, GitLabApi};

const PER_PAGE: &str = "100";

/// HTTP client wrapper for the GitLab REST API v4.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_api: String,
}

/// Merge request as GitLab serializes it; only the fields we surface.
#[derive(Debug, Deserialize)]
struct GitLabMergeRequest {
    iid: u64,
    title: String,
    description: Option<String>,
    state: MergeRequestState,
    created_at: String,
    updated_at: String,
    author: GitLabUser,
    source_branch: String,
    target_branch: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    name: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct GitLabChanges {
    #[serde(default)]
    changes: Vec<ChangeRecord>,
}

impl From<GitLabMergeRequest> for MergeRequestSummary {
    fn from(mr: GitLabMergeRequest) -> Self {
        MergeRequestSummary {
            id: mr.iid,
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            state: mr.state,
            created_at: mr.created_at,
            updated_at: mr.updated_at,
            author: Author {
                name: mr.author.name,
                username: mr.author.username,
            },
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            web_url: mr.web_url,
        }
    }
}

impl GitLabClient {
    /// Create a new client from configuration. Does not contact the server.
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "PRIVATE-TOKEN",
            HeaderValue::from_str(&config.token)
                .map_err(|e| ReportError::Config(format!("Invalid GITLAB_TOKEN header: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("mr-confluence-mcp")
            .build()
            .map_err(|e| ReportError::Remote(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_api: format!("{}/api/v4", config.base_url),
        })
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_api, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = check_status(self.http.get(&url).send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    /// GET every page of a list endpoint, following `x-next-page`.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = self.url(path);
        let mut items = Vec::new();
        let mut page = "1".to_string();

        loop {
            debug!(%url, %page, "GET page");
            let resp = self
                .http
                .get(&url)
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page.as_str())])
                .send()
                .await?;
            let resp = check_status(resp).await?;

            let next = resp
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            let mut batch: Vec<T> = resp.json().await?;
            items.append(&mut batch);

            match next {
                Some(n) if n != page => page = n,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn authenticate(&self) -> Result<()> {
        let _user: serde_json::Value = self.get("/user").await.map_err(|e| match e {
            ReportError::Auth(_) => {
                ReportError::Auth("GitLab rejected the token, check GITLAB_TOKEN".to_string())
            }
            other => other,
        })?;
        Ok(())
    }

    async fn get_project(&self, project: &str) -> Result<Project> {
        self.get(&format!("/projects/{project}")).await
    }

    async fn list_merge_requests(
        &self,
        project_id: u64,
        state: MergeRequestState,
    ) -> Result<Vec<MergeRequestSummary>> {
        let mrs: Vec<GitLabMergeRequest> = self
            .get_all_pages(
                &format!("/projects/{project_id}/merge_requests"),
                &[("state", state.as_str())],
            )
            .await?;
        Ok(mrs.into_iter().map(MergeRequestSummary::from).collect())
    }

    async fn get_merge_request(&self, project_id: u64, iid: u64) -> Result<MergeRequestSummary> {
        let mr: GitLabMergeRequest = self
            .get(&format!("/projects/{project_id}/merge_requests/{iid}"))
            .await
            .map_err(|e| match e {
                ReportError::NotFound(_) => ReportError::NotFound(format!(
                    "merge request !{iid} in project {project_id}"
                )),
                other => other,
            })?;
        Ok(mr.into())
    }

    async fn merge_request_changes(&self, project_id: u64, iid: u64) -> Result<Vec<ChangeRecord>> {
        let changes: GitLabChanges = self
            .get(&format!(
                "/projects/{project_id}/merge_requests/{iid}/changes"
            ))
            .await?;
        Ok(changes.changes)
    }
}
