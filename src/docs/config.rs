use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the docs root
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Every caller-supplied relative path resolves beneath this directory
    pub root: PathBuf,

    /// Entries whose name starts with this marker are not listed
    pub hidden_prefix: String,

    /// Maximum file size for write operations (bytes)
    pub max_write_size: u64,

    /// Whether symlinked path components inside the root are allowed
    pub follow_symlinks: bool,

    /// Maximum search results
    pub search_limit: usize,

    /// Pause between files of a bulk import
    pub import_delay: Duration,

    /// How long a fully successful import report stays visible
    pub auto_dismiss_after: Duration,
}

impl DocsConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("../docs"),
            hidden_prefix: ".".to_string(),
            max_write_size: 50 * 1024 * 1024, // 50MB
            follow_symlinks: false,
            search_limit: 20,
            import_delay: Duration::from_millis(100),
            auto_dismiss_after: Duration::from_secs(3),
        }
    }
}
