use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::docs::DEFAULT_TEMPLATE;
use crate::error::{AppError, AppResult};
use crate::import;
use crate::protocol::{
    ContentQuery, CreateRequest, DeleteRequest, FileNode, ImportFileRequest, ImportFileResponse,
    MessageResponse, NodeKind, SaveRequest, SearchQuery, SearchResult,
};

use super::{required, AppState};

/// GET /files
pub async fn list_files(State(state): State<AppState>) -> AppResult<Json<Vec<FileNode>>> {
    let tree = state
        .docs
        .storage()
        .list()
        .await
        .map_err(|e| AppError::from_storage(e, "Failed to read documentation files", state.dev_mode))?;
    Ok(Json(tree))
}

/// GET /content?path=
pub async fn read_content(
    State(state): State<AppState>,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(query) = query?;
    let path = required(query.path, "File path is required")?;

    let content = state
        .docs
        .storage()
        .read_content(&path)
        .await
        .map_err(|e| AppError::from_storage(e, "Failed to read file content", state.dev_mode))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

/// PUT /save
pub async fn save(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    let message = "File path and content are required";
    let path = required(req.path, message)?;
    let content = req.content.ok_or_else(|| AppError::validation(message))?;

    state
        .docs
        .storage()
        .write(&path, &content)
        .await
        .map_err(|e| AppError::from_storage(e, "Failed to save file", state.dev_mode))?;

    Ok(Json(MessageResponse {
        message: "File saved successfully".to_string(),
        path: None,
    }))
}

/// POST /create
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    let path = required(req.path, "File path is required")?;
    let storage = state.docs.storage();

    let (message, failure) = match req.kind {
        NodeKind::Folder => ("Folder created successfully", "Failed to create folder"),
        NodeKind::File => ("File created successfully", "Failed to create file"),
    };

    let created = match req.kind {
        NodeKind::Folder => storage
            .create_folder(&path)
            .await
            .and_then(|_| storage.validator().normalize(&path)),
        NodeKind::File => {
            let content = req
                .content
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
            storage.create_file(&path, &content).await
        }
    }
    .map_err(|e| AppError::from_storage(e, failure, state.dev_mode))?;

    Ok(Json(MessageResponse {
        message: message.to_string(),
        path: Some(created),
    }))
}

/// DELETE /delete
pub async fn delete(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    let path = required(req.path, "File path is required")?;

    state
        .docs
        .storage()
        .delete(&path)
        .await
        .map_err(|e| AppError::from_storage(e, "Failed to delete file", state.dev_mode))?;

    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_string(),
        path: None,
    }))
}

/// GET /search?q=
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Vec<SearchResult>>> {
    let Query(query) = query?;
    let q = query.q.unwrap_or_default();

    let results = state
        .docs
        .search()
        .search(&q)
        .await
        .map_err(|e| AppError::from_storage(e, "Failed to perform search", state.dev_mode))?;
    Ok(Json(results))
}

/// POST /import-gitlab
pub async fn import_gitlab(
    State(state): State<AppState>,
    payload: Result<Json<ImportFileRequest>, JsonRejection>,
) -> AppResult<Json<ImportFileResponse>> {
    let Json(req) = payload?;
    let message = "File name, path, and content are required";
    let file_name = required(req.file_name, message)?;
    let file_path = required(req.file_path, message)?;
    let content = req.content.ok_or_else(|| AppError::validation(message))?;

    let imported = import::import_file(
        state.docs.storage(),
        &file_name,
        &file_path,
        &content,
        req.repo_name.as_deref(),
        Utc::now(),
    )
    .await
    .map_err(|e| AppError::from_storage(e, "Failed to import file", state.dev_mode))?;

    Ok(Json(ImportFileResponse {
        message: "File imported successfully".to_string(),
        import_path: imported.import_path,
        original_path: imported.original_path,
        size: imported.size,
    }))
}
