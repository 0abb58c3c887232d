mod confluence;
mod gitlab;
mod trait_def;

pub use confluence::ConfluenceClient;
pub use gitlab::GitLabClient;
pub use trait_def::{CreatedPage, GitLabApi, WikiApi};

use crate::error::{ReportError, Result};

/// Map a non-success HTTP status to the crate error taxonomy.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ReportError::Auth(format!("{} returned HTTP {status}", resp.url())));
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ReportError::NotFound(resp.url().to_string()));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ReportError::Remote(format!("HTTP {status}: {body}")));
    }
    Ok(resp)
}
