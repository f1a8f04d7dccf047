//! HTTP client for the document-QA backend.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::ClientError;
use crate::models::{FilesResponse, SearchResponse, UploadResponse};

/// What the terminal client needs from the backend.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<UploadResponse, ClientError>;
    async fn list_files(&self) -> Result<Vec<String>, ClientError>;
    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError>;
}

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Answers wait on a hosted model; keep this above the server's LLM timeout.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %detail, "backend request failed");
    Err(ClientError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl DocumentBackend for BackendClient {
    async fn upload(&self, path: &Path) -> Result<UploadResponse, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::File {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload/"))
            .multipart(form)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn list_files(&self) -> Result<Vec<String>, ClientError> {
        let response = self.client.get(self.url("/files/")).send().await?;
        let files: FilesResponse = check(response).await?.json().await?;
        Ok(files.uploaded_files)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ClientError> {
        let response = self
            .client
            .get(self.url("/search/"))
            .query(&[("query", query)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}
