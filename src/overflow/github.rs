//! GitHub gist store.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LibrarianError, Result};
use crate::overflow::{CreatedGist, GistFiles, GistStore};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("librarian-release/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct FileContent<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateGistRequest<'a> {
    description: &'a str,
    public: bool,
    files: BTreeMap<&'a str, FileContent<'a>>,
}

#[derive(Deserialize)]
struct CreateGistResponse {
    id: String,
    html_url: String,
}

#[derive(Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

/// Gist store backed by the GitHub REST API
pub struct GitHubGistStore {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubGistStore {
    /// Creates a client for `api_url`, authenticating with `token` when given
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LibrarianError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(GitHubGistStore {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Creates a client whose token comes from `GITHUB_TOKEN` or `GH_TOKEN`
    pub fn from_env(api_url: impl Into<String>) -> Result<Self> {
        Self::new(api_url, token_from_env())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_raw(&self, raw_url: &str) -> Result<String> {
        debug!(url = %raw_url, "Fetching truncated gist file");
        let response = self
            .request(self.client.get(raw_url))
            .send()
            .await
            .map_err(|e| LibrarianError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LibrarianError::transport(format!(
                "HTTP {} fetching {}",
                response.status(),
                raw_url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LibrarianError::transport(e.to_string()))
    }
}

/// Read the API token from the environment
pub fn token_from_env() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

impl GistStore for GitHubGistStore {
    fn create_gist<'a>(
        &'a self,
        files: &'a GistFiles,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedGist>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/gists", self.api_url);
            let request = CreateGistRequest {
                description: "Pull request body",
                public: false,
                files: files
                    .iter()
                    .map(|(name, content)| (name.as_str(), FileContent { content }))
                    .collect(),
            };

            info!(url = %url, files = files.len(), "Creating gist");

            let response = self
                .request(self.client.post(&url))
                .json(&request)
                .send()
                .await
                .map_err(|e| LibrarianError::overflow_store(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_else(|e| {
                    debug!("Failed to read error response body: {e}");
                    String::new()
                });
                return Err(LibrarianError::overflow_store(format!(
                    "HTTP {status}: {error_text}"
                )));
            }

            let created: CreateGistResponse = response
                .json()
                .await
                .map_err(|e| LibrarianError::overflow_store(e.to_string()))?;

            debug!(id = %created.id, url = %created.html_url, "Created gist");

            Ok(CreatedGist {
                id: created.id,
                url: created.html_url,
            })
        })
    }

    fn fetch_gist<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GistFiles>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/gists/{}", self.api_url, id);
            debug!(url = %url, "Fetching gist");

            let response = self
                .request(self.client.get(&url))
                .send()
                .await
                .map_err(|e| LibrarianError::transport(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(LibrarianError::transport(format!(
                    "HTTP {status} fetching gist '{id}'"
                )));
            }

            let gist: GistResponse = response
                .json()
                .await
                .map_err(|e| LibrarianError::transport(e.to_string()))?;

            let mut files = GistFiles::new();
            for (name, file) in gist.files {
                let content = match (file.content, file.raw_url) {
                    (Some(content), _) if !file.truncated => content,
                    (_, Some(raw_url)) => self.fetch_raw(&raw_url).await?,
                    (Some(content), None) => content,
                    (None, None) => String::new(),
                };
                files.insert(name, content);
            }

            debug!(id = %id, files = files.len(), "Fetched gist");
            Ok(files)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_gist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gists"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "public": false,
                "files": { "pr-body.md": { "content": "hello" } }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "abc123",
                "html_url": "https://gist.github.com/abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = GitHubGistStore::new(server.uri(), Some("secret".to_string())).unwrap();
        let mut files = GistFiles::new();
        files.insert("pr-body.md".to_string(), "hello".to_string());

        let gist = store.create_gist(&files).await.unwrap();
        assert_eq!(gist.id, "abc123");
        assert_eq!(gist.url, "https://gist.github.com/abc123");
    }

    #[tokio::test]
    async fn test_create_gist_failure_is_overflow_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gists"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Validation Failed"))
            .mount(&server)
            .await;

        let store = GitHubGistStore::new(server.uri(), None).unwrap();
        let err = store.create_gist(&GistFiles::new()).await.unwrap_err();
        match err {
            LibrarianError::OverflowStore(msg) => assert!(msg.contains("Validation Failed")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_gist_follows_truncated_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": {
                    "small.md": { "content": "inline", "truncated": false },
                    "pr-body.md": {
                        "content": "trunc",
                        "truncated": true,
                        "raw_url": format!("{}/raw/pr-body.md", server.uri())
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/pr-body.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("the full body"))
            .mount(&server)
            .await;

        let store = GitHubGistStore::new(server.uri(), None).unwrap();
        let files = store.fetch_gist("abc123").await.unwrap();
        assert_eq!(files.get("small.md").map(String::as_str), Some("inline"));
        assert_eq!(files.get("pr-body.md").map(String::as_str), Some("the full body"));
    }

    #[tokio::test]
    async fn test_fetch_missing_gist_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gists/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = GitHubGistStore::new(server.uri(), None).unwrap();
        let err = store.fetch_gist("nope").await.unwrap_err();
        assert!(matches!(err, LibrarianError::Transport(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let store = GitHubGistStore::new("https://example.com/api/", None).unwrap();
        assert_eq!(store.api_url(), "https://example.com/api");
    }
}
