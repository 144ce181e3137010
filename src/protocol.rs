//! HTTP wire types
//!
//! Field names follow the editor front end (`camelCase`, `type` for node kind).

use serde::{Deserialize, Serialize};

/// Kind of node in a docs or remote tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn is_folder(self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

/// One file or folder.
///
/// `children` is `Some` iff the node is a folder. `content` is a lazily
/// populated cache: `None` means "not loaded", not "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Only populated for nodes sourced from the remote API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileNode {
    pub fn file(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: None,
            content: None,
            size: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Folder,
            children: Some(Vec::new()),
            content: None,
            size: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: Vec<FileNode>) -> Self {
        if self.is_folder() {
            self.children = Some(children);
        }
        self
    }
}

/// Flat listing record consumed by the tree builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Filename,
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    /// 1-indexed line number (content matches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub file: FileNode,
    pub matches: Vec<SearchMatch>,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Pending,
    Importing,
    Success,
    Error,
}

/// Per-file progress entry of a bulk import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus {
    pub file_name: String,
    pub status: ImportState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportStatus {
    pub fn pending(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: ImportState::Pending,
            error: None,
        }
    }
}

// ---- Request bodies ----
//
// Required fields are `Option` so handlers can answer a missing field with the
// uniform 400 envelope instead of a deserializer rejection.

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub path: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub path: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type", default = "default_create_kind")]
    pub kind: NodeKind,
}

fn default_create_kind() -> NodeKind {
    NodeKind::File
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileRequest {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub repo_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabFilesRequest {
    pub repo_url: Option<String>,
    pub access_token: Option<String>,
    #[serde(default)]
    pub nested: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabContentRequest {
    pub repo_url: Option<String>,
    pub access_token: Option<String>,
    pub file_path: Option<String>,
}

// ---- Response bodies ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileResponse {
    pub message: String,
    pub import_path: String,
    pub original_path: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabFilesResponse {
    pub files: Vec<FileNode>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabContentResponse {
    pub content: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Uniform error envelope returned by every handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageError {
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("path escapes the docs root: {attempted_path}")]
    PathTraversal { attempted_path: String },
    #[error("permission denied for {path}: {reason}")]
    PermissionDenied { path: String, reason: String },
    #[error("not a directory: {path}")]
    NotADirectory { path: String },
    #[error("not a file: {path}")]
    NotAFile { path: String },
    #[error("already exists: {path}")]
    AlreadyExists { path: String },
    #[error("file too large: {path} ({size} > {max_size} bytes)")]
    FileTooLarge { path: String, size: u64, max_size: u64 },
    #[error("invalid path: {path}")]
    InvalidPath { path: String },
    #[error("io error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_serializes_kind_as_type_and_skips_absent_fields() {
        let node = FileNode::file("a_md", "a.md", "a.md");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "file");
        assert!(json.get("children").is_none());
        assert!(json.get("content").is_none());

        let folder = FileNode::folder("docs", "docs", "docs");
        let json = serde_json::to_value(&folder).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[test]
    fn create_request_defaults_to_file() {
        let req: CreateRequest = serde_json::from_str(r#"{"path":"a.md"}"#).unwrap();
        assert_eq!(req.kind, NodeKind::File);
        let req: CreateRequest = serde_json::from_str(r#"{"path":"d","type":"folder"}"#).unwrap();
        assert_eq!(req.kind, NodeKind::Folder);
    }

    #[test]
    fn import_status_uses_camel_case() {
        let status = ImportStatus::pending("app.py");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["fileName"], "app.py");
        assert_eq!(json["status"], "pending");
    }
}
