//! GitHub contents API source

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{FileDescriptor, RemoteSource};
use crate::config::RepositoryConfig;
use crate::error::SourceError;

/// The contents endpoint answers with an array for directories and an
/// object for single files
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Directory(Vec<FileDescriptor>),
    File(FileDescriptor),
}

#[derive(Deserialize)]
struct FileContent {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

/// Reads files from a GitHub repository through the REST contents API
#[derive(Clone)]
pub struct GithubSource {
    client: Client,
    headers: HeaderMap,
    api_base: String,
    owner: String,
    repo: String,
}

impl GithubSource {
    pub fn new(config: &RepositoryConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Config(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitpost-rs/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let auth = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|_| SourceError::Config("token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, auth);
        }

        Ok(Self {
            client,
            headers,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.name.clone(),
        })
    }

    /// Whether requests carry a credential
    pub fn is_authenticated(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    /// GET a contents URL and return the body of a successful response
    async fn get(&self, url: &str) -> Result<String, SourceError> {
        tracing::debug!("Fetching content from: {}", url);

        let resp = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| SourceError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| SourceError::Network {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RemoteSource for GithubSource {
    async fn list_files(&self, path: &str) -> Result<Vec<FileDescriptor>, SourceError> {
        let url = self.contents_url(path);
        let body = self.get(&url).await?;

        let listing: Listing = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            url: url.clone(),
            message: format!("expected a directory listing or a single file: {}", e),
        })?;

        Ok(match listing {
            Listing::Directory(entries) => entries,
            Listing::File(entry) => vec![entry],
        })
    }

    async fn fetch_file_content(&self, path: &str) -> Result<String, SourceError> {
        let url = self.contents_url(path);
        let body = self.get(&url).await?;

        let file: FileContent = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            url: url.clone(),
            message: format!("expected file contents: {}", e),
        })?;

        if file.encoding != "base64" {
            return Ok(file.content);
        }

        decode_base64(&file.content).map_err(|message| SourceError::Decode { url, message })
    }
}

/// GitHub wraps base64 payloads at 60 columns
fn decode_base64(content: &str) -> Result<String, String> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| format!("invalid base64 content: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("content is not UTF-8: {}", e))
}
