//! Sequential bulk import with per-file progress
//!
//! Files are processed one at a time in selection order. The batch is not
//! transactional: each file ends as `success` or `error` on its own.

use std::time::Duration;

use chrono::Utc;

use crate::docs::config::DocsConfig;
use crate::docs::storage::DocsStorage;
use crate::protocol::{ImportState, ImportStatus, NodeKind, StorageError};
use crate::relay::RelayError;
use crate::tree::TreeError;
use crate::workspace::{Mutation, Workspace};

use super::{import_file, provenance, ContentSource, ImportedFile};

/// One file selected for import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub path: String,
    /// Already-fetched content; fetched from the source when `None`
    pub content: Option<String>,
}

impl RemoteFile {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: crate::tree::leaf_name(&path).to_string(),
            path,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub repo_name: Option<String>,
    pub delay: Duration,
    pub auto_dismiss_after: Duration,
}

impl ImportOptions {
    pub fn from_config(config: &DocsConfig, repo_name: Option<String>) -> Self {
        Self {
            repo_name,
            delay: config.import_delay,
            auto_dismiss_after: config.auto_dismiss_after,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("{0}")]
    Fetch(#[from] RelayError),
    #[error("{0}")]
    Write(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub statuses: Vec<ImportStatus>,
    pub imported: Vec<ImportedFile>,
    auto_dismiss: Duration,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.count(ImportState::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(ImportState::Error)
    }

    fn count(&self, state: ImportState) -> usize {
        self.statuses.iter().filter(|s| s.status == state).count()
    }

    /// How long the progress view may stay up before dismissing itself.
    /// `None` when any file failed: the view stays until closed.
    pub fn auto_dismiss_after(&self) -> Option<Duration> {
        (self.failed() == 0 && !self.statuses.is_empty()).then_some(self.auto_dismiss)
    }

    pub fn summary(&self) -> String {
        let total = self.statuses.len();
        match self.failed() {
            0 => format!("Imported {} of {} files", self.succeeded(), total),
            failed => format!(
                "Imported {} of {} files ({} failed)",
                self.succeeded(),
                total,
                failed
            ),
        }
    }
}

pub struct Importer<'a, S: ContentSource + ?Sized> {
    storage: &'a DocsStorage,
    source: &'a S,
    options: ImportOptions,
}

impl<'a, S: ContentSource + ?Sized> Importer<'a, S> {
    pub fn new(storage: &'a DocsStorage, source: &'a S, options: ImportOptions) -> Self {
        Self {
            storage,
            source,
            options,
        }
    }

    /// Import `files` in order, reporting the whole status list to
    /// `on_progress` after every change. Each file is inserted into
    /// `workspace` before its write and removed again if the write fails.
    pub async fn run(
        &self,
        files: Vec<RemoteFile>,
        workspace: &mut Workspace,
        mut on_progress: impl FnMut(&[ImportStatus]),
    ) -> ImportReport {
        let mut statuses: Vec<ImportStatus> =
            files.iter().map(|f| ImportStatus::pending(f.name.clone())).collect();
        let mut imported = Vec::new();
        on_progress(&statuses);

        let total = files.len();
        for (index, file) in files.into_iter().enumerate() {
            statuses[index].status = ImportState::Importing;
            on_progress(&statuses);

            match self.import_one(&file, workspace).await {
                Ok(done) => {
                    statuses[index].status = ImportState::Success;
                    imported.push(done);
                }
                Err(e) => {
                    tracing::warn!("Failed to import {}: {}", file.path, e);
                    statuses[index].status = ImportState::Error;
                    statuses[index].error = Some(e.to_string());
                }
            }
            on_progress(&statuses);

            if index + 1 < total && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        ImportReport {
            statuses,
            imported,
            auto_dismiss: self.options.auto_dismiss_after,
        }
    }

    async fn import_one(
        &self,
        file: &RemoteFile,
        workspace: &mut Workspace,
    ) -> Result<ImportedFile, ImportError> {
        let content = match &file.content {
            Some(content) => content.clone(),
            None => self.source.fetch(&file.path).await?,
        };

        let repo_name = self.options.repo_name.as_deref();
        let destination = provenance::import_destination(repo_name, &file.path);
        // The tree is keyed by the same normalized path the write reports.
        // Re-importing a known file conflicts in the tree: nothing to insert or undo.
        let undo = match self.storage.validator().normalize(&destination) {
            Ok(destination) => workspace
                .insert_path(&destination, NodeKind::File)
                .unwrap_or_else(|e| {
                    if !matches!(e, TreeError::NameConflict { .. }) {
                        tracing::debug!("Skipping optimistic insert of {}: {}", destination, e);
                    }
                    Vec::new()
                }),
            Err(_) => Vec::new(),
        };

        match import_file(
            self.storage,
            &file.name,
            &file.path,
            &content,
            repo_name,
            Utc::now(),
        )
        .await
        {
            Ok(done) => {
                let update = Mutation::UpdateContent {
                    path: done.import_path.clone(),
                    content: None,
                };
                // Drop any cached content so the next selection reloads it.
                if let Err(e) = workspace.apply(update) {
                    tracing::debug!("Could not reset cached content for {}: {}", done.import_path, e);
                }
                Ok(done)
            }
            Err(e) => {
                workspace.revert(undo);
                Err(e.into())
            }
        }
    }
}
