use tracing::warn;

use crate::analysis::DiffCounting;
use crate::error::{ReportError, Result};

const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

/// Server configuration, built once at startup and handed to each client.
#[derive(Debug, Clone)]
pub struct Config {
    pub gitlab: GitLabConfig,
    /// `None` when the Confluence variables are absent; publishing is then disabled.
    pub confluence: Option<ConfluenceConfig>,
    pub diff_counting: DiffCounting,
}

/// Connection settings for the GitLab instance.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance (e.g. `https://gitlab.example.com`)
    pub base_url: String,
    /// Personal access token sent as `PRIVATE-TOKEN`
    pub token: String,
    /// Project used when a tool call omits `project_id`
    pub project_id: String,
}

/// Connection settings for Confluence.
#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub username: String,
    /// API token, used as the basic-auth password
    pub token: String,
    /// Space key that reports are published into
    pub space: String,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore missing .env
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let token = var("GITLAB_TOKEN");
        if token.is_none() {
            missing.push("GITLAB_TOKEN");
        }
        let project_id = var("GITLAB_PROJECT_ID");
        if project_id.is_none() {
            missing.push("GITLAB_PROJECT_ID");
        }
        let (Some(token), Some(project_id)) = (token, project_id) else {
            return Err(ReportError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        };

        let base_url = normalize_base_url(
            "GITLAB_URL",
            &var("GITLAB_URL").unwrap_or_else(|| DEFAULT_GITLAB_URL.to_string()),
        )?;

        let confluence = confluence_from(&var)?;

        let diff_counting = match var("DIFF_STATS_MODE") {
            Some(mode) => mode.parse()?,
            None => DiffCounting::default(),
        };

        Ok(Config {
            gitlab: GitLabConfig {
                base_url,
                token,
                project_id,
            },
            confluence,
            diff_counting,
        })
    }
}

/// The Confluence group is all-or-nothing: a partial group disables publishing.
fn confluence_from<F>(var: &F) -> Result<Option<ConfluenceConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    const KEYS: [&str; 4] = [
        "CONFLUENCE_URL",
        "CONFLUENCE_USERNAME",
        "CONFLUENCE_TOKEN",
        "CONFLUENCE_SPACE",
    ];
    let values: Vec<Option<String>> = KEYS.iter().map(|k| var(*k)).collect();

    let missing: Vec<&str> = KEYS
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if missing.len() == KEYS.len() {
        warn!("Confluence credentials not provided; publishing to Confluence is disabled");
        return Ok(None);
    }
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            "Confluence configuration is incomplete; publishing to Confluence is disabled"
        );
        return Ok(None);
    }

    let mut values = values.into_iter().flatten();
    let (Some(url), Some(username), Some(token), Some(space)) =
        (values.next(), values.next(), values.next(), values.next())
    else {
        return Ok(None);
    };

    Ok(Some(ConfluenceConfig {
        base_url: normalize_base_url("CONFLUENCE_URL", &url)?,
        username,
        token,
        space,
    }))
}

/// Validate that `value` is an absolute http(s) URL and strip trailing slashes.
fn normalize_base_url(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ReportError::Config(format!("{name} is not a valid URL ({trimmed}): {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ReportError::Config(format!(
            "{name} must be an http or https URL, got {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}
