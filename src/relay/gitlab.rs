//! GitLab REST relay: repository tree listing and raw file content

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::import::ContentSource;
use crate::protocol::{FlatEntry, NodeKind};

use super::RelayError;

pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";
const PER_PAGE: u32 = 100;
const DEFAULT_MAX_PAGES: u32 = 50;

fn repo_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"gitlab\.com/(.+?)(?:\.git)?$").ok())
        .as_ref()
}

/// Extract `namespace/project` from a GitLab repository URL.
pub fn parse_project_path(repo_url: &str) -> Result<String, RelayError> {
    let trimmed = repo_url.trim().trim_end_matches('/');
    repo_url_pattern()
        .and_then(|pattern| pattern.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|path| !path.is_empty())
        .ok_or(RelayError::InvalidRepoUrl)
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    id: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    api_base: String,
    git_ref: String,
    max_pages: u32,
}

impl GitLabClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            git_ref: git_ref.into(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    fn project_url(&self, project: &str) -> String {
        format!("{}/projects/{}", self.api_base, urlencoding::encode(project))
    }

    /// List every entry of the repository tree as flat `{path, type}` records.
    /// `tree` entries become folders and `blob` entries files; anything else
    /// (submodule commits) is skipped.
    pub async fn list_files(&self, repo_url: &str, token: &str) -> Result<Vec<FlatEntry>, RelayError> {
        let project = parse_project_path(repo_url)?;
        let base = format!("{}/repository/tree", self.project_url(&project));

        let mut entries = Vec::new();
        let mut page: u32 = 1;
        loop {
            let response = self
                .http
                .get(&base)
                .query(&[
                    ("recursive", "true".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .bearer_auth(token)
                .send()
                .await?;
            let response = check_status(response).await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let items: Vec<TreeItem> = response
                .json()
                .await
                .map_err(|e| RelayError::Decode(e.to_string()))?;
            entries.extend(items.into_iter().filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "tree" => NodeKind::Folder,
                    "blob" => NodeKind::File,
                    other => {
                        tracing::debug!("Skipping GitLab entry {} of type {}", item.path, other);
                        return None;
                    }
                };
                Some(FlatEntry {
                    id: item.id,
                    path: item.path,
                    kind,
                    size: None,
                })
            }));

            match next_page {
                Some(next) if next > page && page < self.max_pages => page = next,
                Some(_) => {
                    tracing::warn!(
                        "Stopped listing {} after {} pages; results are truncated",
                        project,
                        page
                    );
                    break;
                }
                None => break,
            }
        }

        tracing::info!("Listed {} entries from GitLab project {}", entries.len(), project);
        Ok(entries)
    }

    /// Raw content of one file at the configured ref
    pub async fn file_content(&self, repo_url: &str, token: &str, file_path: &str) -> Result<String, RelayError> {
        let project = parse_project_path(repo_url)?;
        let url = format!(
            "{}/repository/files/{}/raw",
            self.project_url(&project),
            urlencoding::encode(file_path)
        );

        let response = self
            .http
            .get(&url)
            .query(&[("ref", self.git_ref.as_str())])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_status(response).await?;
        response.text().await.map_err(|e| RelayError::Decode(e.to_string()))
    }

    /// Bind to one repository for use as an import content source
    pub fn source(&self, repo_url: impl Into<String>, token: impl Into<String>) -> GitLabSource {
        GitLabSource {
            client: self.clone(),
            repo_url: repo_url.into(),
            token: token.into(),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("GitLab API error: {} {}", status.as_u16(), body);
    Err(RelayError::Upstream {
        status: status.as_u16(),
        message: format!("GitLab API error: {}", status.as_u16()),
        details: (!body.is_empty()).then(|| serde_json::Value::String(body)),
    })
}

/// A GitLab repository viewed as a source of file content
#[derive(Clone)]
pub struct GitLabSource {
    client: GitLabClient,
    repo_url: String,
    token: String,
}

impl GitLabSource {
    pub async fn list_files(&self) -> Result<Vec<FlatEntry>, RelayError> {
        self.client.list_files(&self.repo_url, &self.token).await
    }
}

#[async_trait]
impl ContentSource for GitLabSource {
    async fn fetch(&self, path: &str) -> Result<String, RelayError> {
        self.client.file_content(&self.repo_url, &self.token, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_project_path_from_common_url_shapes() {
        assert_eq!(
            parse_project_path("https://gitlab.com/my-org/my-repo").unwrap(),
            "my-org/my-repo"
        );
        assert_eq!(
            parse_project_path("https://gitlab.com/group/sub/project.git").unwrap(),
            "group/sub/project"
        );
        assert_eq!(
            parse_project_path("https://gitlab.com/my-org/my-repo/").unwrap(),
            "my-org/my-repo"
        );
    }

    #[test]
    fn rejects_non_gitlab_urls() {
        assert!(matches!(
            parse_project_path("https://github.com/my-org/my-repo"),
            Err(RelayError::InvalidRepoUrl)
        ));
        assert!(matches!(parse_project_path("gitlab.com/"), Err(RelayError::InvalidRepoUrl)));
    }

    #[test]
    fn project_url_encodes_namespace_separator() {
        let client = GitLabClient::new(reqwest::Client::new(), "https://gitlab.example/api/v4/", "main");
        assert_eq!(
            client.project_url("my-org/my-repo"),
            "https://gitlab.example/api/v4/projects/my-org%2Fmy-repo"
        );
    }
}
