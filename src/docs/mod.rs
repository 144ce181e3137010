//! Docs root service: path-safe storage plus search

pub mod config;
pub mod path_utils;
pub mod search;
pub mod security;
pub mod storage;
pub mod text;


use std::sync::Arc;

use config::DocsConfig;
use search::DocsSearch;
use security::PathValidator;
use storage::DocsStorage;

/// Template written by a file create that carries no content
pub const DEFAULT_TEMPLATE: &str = "# New Document\n\nStart writing your content here...";

pub struct DocsService {
    config: Arc<DocsConfig>,
    validator: Arc<PathValidator>,
    storage: DocsStorage,
    search: DocsSearch,
}

impl DocsService {
    pub fn new(config: DocsConfig) -> Self {
        let config = Arc::new(config);
        let validator = Arc::new(PathValidator::new(config.clone()));
        let storage = DocsStorage::new(validator.clone(), config.clone());
        let search = DocsSearch::new(storage.clone());
        Self {
            config,
            validator,
            storage,
            search,
        }
    }

    pub fn config(&self) -> &DocsConfig {
        self.config.as_ref()
    }

    pub fn validator(&self) -> &PathValidator {
        self.validator.as_ref()
    }

    pub fn storage(&self) -> &DocsStorage {
        &self.storage
    }

    pub fn search(&self) -> &DocsSearch {
        &self.search
    }
}
