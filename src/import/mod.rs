//! Importing remote files into the docs root

pub mod orchestrator;
pub mod provenance;


use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::docs::storage::DocsStorage;
use crate::protocol::StorageError;
use crate::relay::RelayError;

pub use orchestrator::{ImportError, ImportOptions, ImportReport, Importer, RemoteFile};

/// Where file content for an import comes from
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, RelayError>;
}

/// Outcome of one successful import write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub import_path: String,
    pub original_path: String,
    /// Bytes written, header included
    pub size: usize,
}

/// Write one remote file under `codebase/<repo>/` with its provenance header.
/// An existing file at the destination is overwritten.
pub async fn import_file(
    storage: &DocsStorage,
    file_name: &str,
    file_path: &str,
    content: &str,
    repo_name: Option<&str>,
    imported_at: DateTime<Utc>,
) -> Result<ImportedFile, StorageError> {
    let destination = provenance::import_destination(repo_name, file_path);
    let processed = provenance::with_provenance(file_name, file_path, content, imported_at);

    let import_path = storage.write(&destination, &processed).await?;
    tracing::info!("Imported {} -> {}", file_path, import_path);

    Ok(ImportedFile {
        import_path,
        original_path: file_path.to_string(),
        size: processed.len(),
    })
}
