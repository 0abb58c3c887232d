use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ConfluenceConfig;
use crate::error::{ReportError, Result};

use super::{check_status, CreatedPage, WikiApi};

/// HTTP client wrapper for the Confluence REST API.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    http: reqwest::Client,
    base_api: String,
}

#[derive(Debug, Deserialize)]
struct ContentSearch {
    #[serde(default)]
    results: Vec<ContentRef>,
}

#[derive(Debug, Deserialize)]
struct ContentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContentCreated {
    id: String,
    #[serde(rename = "_links")]
    links: ContentLinks,
}

#[derive(Debug, Deserialize)]
struct ContentLinks {
    base: String,
    webui: String,
}

impl ConfluenceClient {
    /// Create a new client using HTTP basic auth (`username:token`).
    pub fn new(config: &ConfluenceConfig) -> Result<Self> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", config.username, config.token));

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|e| ReportError::Config(format!("Invalid Confluence credentials: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("mr-confluence-mcp")
            .build()
            .map_err(|e| ReportError::Remote(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_api: format!("{}/rest/api", config.base_url),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_api, path)
    }
}

#[async_trait]
impl WikiApi for ConfluenceClient {
    async fn get_page_id(&self, space: &str, title: &str) -> Result<Option<String>> {
        let url = self.url("/content");
        debug!(%url, space, title, "looking up Confluence page");
        let resp = self
            .http
            .get(&url)
            .query(&[("spaceKey", space), ("title", title), ("type", "page")])
            .send()
            .await?;
        let found: ContentSearch = check_status(resp).await?.json().await?;
        Ok(found.results.into_iter().next().map(|c| c.id))
    }

    async fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedPage> {
        let mut payload = json!({
            "type": "page",
            "title": title,
            "space": { "key": space },
            "body": {
                "wiki": { "value": body, "representation": "wiki" }
            },
        });
        if let Some(parent) = parent_id {
            payload["ancestors"] = json!([{ "id": parent }]);
        }

        let url = self.url("/content");
        debug!(%url, space, title, ?parent_id, "creating Confluence page");
        let resp = self.http.post(&url).json(&payload).send().await?;
        let created: ContentCreated = check_status(resp).await?.json().await?;

        Ok(CreatedPage {
            id: created.id,
            url: format!("{}{}", created.links.base, created.links.webui),
        })
    }
}
