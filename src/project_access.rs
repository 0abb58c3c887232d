use std::sync::Arc;

use tracing::{error, info, warn};

use crate::client::{GitLabApi, GitLabClient};
use crate::config::GitLabConfig;
use crate::error::{ReportError, Result};
use crate::types::{ChangeRecord, MergeRequestState, MergeRequestSummary, Project};

/// Authenticated access to GitLab projects and their merge requests.
///
/// Tolerates both numeric IDs and `namespace/name` paths as project identifiers.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    client: Arc<dyn GitLabApi>,
}

impl ProjectAccess {
    /// Build the GitLab client and verify the token before returning.
    pub async fn connect(config: &GitLabConfig) -> Result<Self> {
        let client = GitLabClient::new(config)?;
        Self::with_client(Arc::new(client)).await
    }

    /// Wrap an existing client, authenticating eagerly.
    pub async fn with_client(client: Arc<dyn GitLabApi>) -> Result<Self> {
        if let Err(e) = client.authenticate().await {
            error!(error = %e, "GitLab authentication failed");
            return Err(e);
        }
        info!("Successfully authenticated with GitLab");
        Ok(Self { client })
    }

    /// Look a project up by the identifier as given, falling back once to the
    /// fully encoded path when the direct lookup finds nothing.
    ///
    /// Identifiers that could address another API route are rejected before
    /// any request is made.
    pub async fn resolve_project(&self, identifier: &str) -> Result<Project> {
        info!(project = identifier, "resolving project");
        if !is_valid_identifier(identifier) {
            warn!(project = identifier, "rejecting malformed project identifier");
            return Err(ReportError::Resolution(identifier.to_string()));
        }

        let direct_key = encode_segments(identifier);
        let direct = match self.client.get_project(&direct_key).await {
            Ok(project) => {
                info!(project = %project.name, id = project.id, "resolved project");
                return Ok(project);
            }
            Err(e) if e.is_not_found() => e,
            Err(e) => return Err(e),
        };

        let encoded = encode_path(identifier);
        if encoded == direct_key {
            return Err(ReportError::Resolution(identifier.to_string()));
        }

        info!(project = identifier, "direct lookup failed, retrying as encoded path: {direct}");
        match self.client.get_project(&encoded).await {
            Ok(project) => {
                info!(project = %project.name, id = project.id, "resolved project by path");
                Ok(project)
            }
            Err(e) if e.is_not_found() => Err(ReportError::Resolution(identifier.to_string())),
            Err(e) => Err(e),
        }
    }

    /// List a project's merge requests in `state`, in the order GitLab returns them.
    pub async fn list_merge_requests(
        &self,
        identifier: &str,
        state: MergeRequestState,
    ) -> Result<Vec<MergeRequestSummary>> {
        let result = async {
            let project = self.resolve_project(identifier).await?;
            info!(%state, "fetching merge requests");
            self.client.list_merge_requests(project.id, state).await
        }
        .await;

        match result {
            Ok(mrs) => {
                info!(count = mrs.len(), "retrieved merge requests");
                Ok(mrs)
            }
            Err(e) => {
                error!(project = identifier, %state, error = %e, "failed to retrieve merge requests");
                Err(ReportError::MergeRequestList {
                    project: identifier.to_string(),
                    state: state.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    pub async fn get_merge_request(&self, project: &Project, iid: u64) -> Result<MergeRequestSummary> {
        self.client.get_merge_request(project.id, iid).await
    }

    pub async fn merge_request_changes(
        &self,
        project: &Project,
        iid: u64,
    ) -> Result<Vec<ChangeRecord>> {
        self.client.merge_request_changes(project.id, iid).await
    }
}

/// A project ID or `namespace/name` path: non-empty segments, none of them
/// `.` or `..`, and no query or fragment delimiters.
fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.contains(['?', '#'])
        && identifier
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Percent-encode each segment, keeping `/` between them.
fn encode_segments(identifier: &str) -> String {
    identifier
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode the whole path, separators included, so GitLab treats it as one segment.
fn encode_path(identifier: &str) -> String {
    urlencoding::encode(identifier).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::types::Author;

    /// In-memory GitLab keyed by the exact lookup string GitLab would receive.
    #[derive(Debug, Default)]
    pub(crate) struct FakeGitLab {
        pub reject_token: bool,
        pub projects: HashMap<String, Project>,
        pub merge_requests: Vec<MergeRequestSummary>,
        pub changes: HashMap<u64, Vec<ChangeRecord>>,
        pub lookups: Mutex<Vec<String>>,
    }

    impl FakeGitLab {
        pub(crate) fn with_project(mut self, key: &str, id: u64) -> Self {
            self.projects.insert(
                key.to_string(),
                Project {
                    id,
                    name: format!("project-{id}"),
                    path_with_namespace: key.replace("%2F", "/"),
                    web_url: String::new(),
                },
            );
            self
        }

        pub(crate) fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    pub(crate) fn summary(iid: u64, state: MergeRequestState) -> MergeRequestSummary {
        MergeRequestSummary {
            id: iid,
            title: format!("MR {iid}"),
            description: String::new(),
            state,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-02T00:00:00Z".to_string(),
            author: Author {
                name: "Alice".to_string(),
                username: "alice".to_string(),
            },
            source_branch: format!("feature-{iid}"),
            target_branch: "main".to_string(),
            web_url: format!("https://gitlab.example.com/group/repo/-/merge_requests/{iid}"),
        }
    }

    #[async_trait]
    impl GitLabApi for FakeGitLab {
        async fn authenticate(&self) -> Result<()> {
            if self.reject_token {
                return Err(ReportError::Auth("token rejected".to_string()));
            }
            Ok(())
        }

        async fn get_project(&self, project: &str) -> Result<Project> {
            self.lookups.lock().unwrap().push(project.to_string());
            self.projects
                .get(project)
                .cloned()
                .ok_or_else(|| ReportError::NotFound(format!("/projects/{project}")))
        }

        async fn list_merge_requests(
            &self,
            _project_id: u64,
            state: MergeRequestState,
        ) -> Result<Vec<MergeRequestSummary>> {
            Ok(self
                .merge_requests
                .iter()
                .filter(|mr| state == MergeRequestState::All || mr.state == state)
                .cloned()
                .collect())
        }

        async fn get_merge_request(&self, project_id: u64, iid: u64) -> Result<MergeRequestSummary> {
            self.merge_requests
                .iter()
                .find(|mr| mr.id == iid)
                .cloned()
                .ok_or_else(|| {
                    ReportError::NotFound(format!("merge request !{iid} in project {project_id}"))
                })
        }

        async fn merge_request_changes(
            &self,
            _project_id: u64,
            iid: u64,
        ) -> Result<Vec<ChangeRecord>> {
            Ok(self.changes.get(&iid).cloned().unwrap_or_default())
        }
    }

    async fn access(fake: FakeGitLab) -> (ProjectAccess, Arc<FakeGitLab>) {
        let fake = Arc::new(fake);
        let access = ProjectAccess::with_client(fake.clone()).await.unwrap();
        (access, fake)
    }

    #[tokio::test]
    async fn test_rejected_token_fails_construction() {
        let fake = FakeGitLab {
            reject_token: true,
            ..FakeGitLab::default()
        };
        let err = ProjectAccess::with_client(Arc::new(fake)).await.unwrap_err();
        assert!(matches!(err, ReportError::Auth(_)));
    }

    #[tokio::test]
    async fn test_numeric_id_resolves_without_fallback() {
        let (access, fake) = access(FakeGitLab::default().with_project("42", 42)).await;

        let project = access.resolve_project("42").await.unwrap();
        assert_eq!(project.id, 42);
        assert_eq!(fake.lookups(), vec!["42".to_string()]);
    }

    #[tokio::test]
    async fn test_path_falls_back_to_encoded_once() {
        let (access, fake) = access(FakeGitLab::default().with_project("group%2Frepo", 7)).await;

        let project = access.resolve_project("group/repo").await.unwrap();
        assert_eq!(project.id, 7);
        assert_eq!(
            fake.lookups(),
            vec!["group/repo".to_string(), "group%2Frepo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_resolution_error() {
        let (access, fake) = access(FakeGitLab::default()).await;

        let err = access.resolve_project("group/missing").await.unwrap_err();
        assert!(matches!(err, ReportError::Resolution(ref id) if id == "group/missing"));
        assert_eq!(fake.lookups().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_does_not_retry() {
        let (access, fake) = access(FakeGitLab::default()).await;

        let err = access.resolve_project("999").await.unwrap_err();
        assert!(matches!(err, ReportError::Resolution(_)));
        assert_eq!(fake.lookups(), vec!["999".to_string()]);
    }

    #[tokio::test]
    async fn test_traversal_identifiers_never_reach_gitlab() {
        let (access, fake) = access(FakeGitLab::default().with_project("user", 1)).await;

        for identifier in ["../user", "group/../user", "./repo", "group//repo", "/repo", "repo/", ""] {
            let err = access.resolve_project(identifier).await.unwrap_err();
            assert!(
                matches!(err, ReportError::Resolution(ref id) if id == identifier),
                "{identifier:?} gave {err:?}"
            );
        }
        assert!(fake.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_query_and_fragment_identifiers_rejected() {
        let (access, fake) = access(FakeGitLab::default().with_project("repo", 1)).await;

        for identifier in ["repo?private=true", "group/repo#x", "repo?"] {
            let err = access.resolve_project(identifier).await.unwrap_err();
            assert!(matches!(err, ReportError::Resolution(_)), "{identifier:?} gave {err:?}");
        }
        assert!(fake.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_characters_encoded_per_segment() {
        let (access, fake) = access(FakeGitLab::default().with_project("my%20group%2Fa%2Bb", 3)).await;

        let project = access.resolve_project("my group/a+b").await.unwrap();
        assert_eq!(project.id, 3);
        assert_eq!(
            fake.lookups(),
            vec!["my%20group/a%2Bb".to_string(), "my%20group%2Fa%2Bb".to_string()]
        );
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("42"));
        assert!(is_valid_identifier("group/sub/repo"));
        assert!(is_valid_identifier("group/repo.name"));
        assert!(!is_valid_identifier("group/.."));
        assert!(!is_valid_identifier("a/./b"));
        assert!(!is_valid_identifier("a?b"));
    }

    #[tokio::test]
    async fn test_list_filters_by_state_and_keeps_order() {
        let fake = FakeGitLab {
            merge_requests: vec![
                summary(3, MergeRequestState::Opened),
                summary(2, MergeRequestState::Merged),
                summary(1, MergeRequestState::Opened),
            ],
            ..FakeGitLab::default()
        }
        .with_project("5", 5);
        let (access, _) = access(fake).await;

        let opened = access
            .list_merge_requests("5", MergeRequestState::Opened)
            .await
            .unwrap();
        assert_eq!(opened.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 1]);
        assert!(opened.iter().all(|m| m.state == MergeRequestState::Opened));

        let closed = access
            .list_merge_requests("5", MergeRequestState::Closed)
            .await
            .unwrap();
        assert!(closed.is_empty());
    }

    #[tokio::test]
    async fn test_list_wraps_resolution_failure_with_context() {
        let (access, _) = access(FakeGitLab::default()).await;

        let err = access
            .list_merge_requests("group/missing", MergeRequestState::Merged)
            .await
            .unwrap_err();
        match err {
            ReportError::MergeRequestList {
                project,
                state,
                source,
            } => {
                assert_eq!(project, "group/missing");
                assert_eq!(state, "merged");
                assert!(matches!(*source, ReportError::Resolution(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
