use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::protocol::{
    FileNode, GitLabContentRequest, GitLabContentResponse, GitLabFilesRequest, GitLabFilesResponse,
};
use crate::tree;

use super::{required, AppState};

/// POST /gitlab/files
pub async fn gitlab_files(
    State(state): State<AppState>,
    payload: Result<Json<GitLabFilesRequest>, JsonRejection>,
) -> AppResult<Json<GitLabFilesResponse>> {
    let Json(req) = payload?;
    let message = "Repository URL and access token are required";
    let repo_url = required(req.repo_url, message)?;
    let token = required(req.access_token, message)?;

    let entries = state
        .gitlab
        .list_files(&repo_url, &token)
        .await
        .map_err(|e| AppError::from_relay(e, "Failed to fetch files from GitLab", state.dev_mode))?;

    let files = if req.nested {
        tree::build_tree(entries)
    } else {
        entries.into_iter().map(FileNode::from).collect()
    };

    Ok(Json(GitLabFilesResponse {
        files,
        message: "Files fetched successfully".to_string(),
    }))
}

/// POST /gitlab/file-content
pub async fn gitlab_file_content(
    State(state): State<AppState>,
    payload: Result<Json<GitLabContentRequest>, JsonRejection>,
) -> AppResult<Json<GitLabContentResponse>> {
    let Json(req) = payload?;
    let message = "Repository URL, access token, and file path are required";
    let repo_url = required(req.repo_url, message)?;
    let token = required(req.access_token, message)?;
    let file_path = required(req.file_path, message)?;

    let content = state
        .gitlab
        .file_content(&repo_url, &token, &file_path)
        .await
        .map_err(|e| {
            AppError::from_relay(e, "Failed to fetch file content from GitLab", state.dev_mode)
        })?;

    Ok(Json(GitLabContentResponse {
        content,
        message: "File content fetched successfully".to_string(),
    }))
}

/// POST /ai/chat
///
/// `message` and `action` are required; `currentContent` and `filePath`
/// default to empty strings. Everything else is forwarded untouched.
pub async fn ai_chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(mut body) = payload?;
    let fields = body
        .as_object_mut()
        .ok_or_else(|| AppError::validation("Request body must be a JSON object"))?;

    let has_text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    };
    if !has_text("message") || !has_text("action") {
        return Err(AppError::validation("Message and action are required"));
    }
    for key in ["currentContent", "filePath"] {
        fields
            .entry(key)
            .or_insert_with(|| Value::String(String::new()));
    }

    let reply = state
        .ai
        .chat(&body)
        .await
        .map_err(|e| AppError::from_relay(e, "Internal server error", state.dev_mode))?;
    Ok(Json(reply))
}
