use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::docs::config::DocsConfig;
use crate::relay::{ai, gitlab};

/// Process-wide settings; every flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct AppConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "DOCDESK_HOST", default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Port for the HTTP server
    #[arg(long, env = "DOCDESK_PORT", default_value_t = 3000, global = true)]
    pub port: u16,

    /// Directory holding the documentation tree
    #[arg(long, env = "DOCDESK_DOCS_ROOT", default_value = "../docs", global = true)]
    pub docs_root: PathBuf,

    /// Base URL of the AI backend
    #[arg(long, env = "BACKEND_URL", default_value = ai::DEFAULT_BACKEND_URL, global = true)]
    pub backend_url: String,

    /// GitLab REST API base
    #[arg(long, env = "GITLAB_API_URL", default_value = gitlab::DEFAULT_API_BASE, global = true)]
    pub gitlab_api: String,

    /// Git ref used for raw file reads
    #[arg(long, env = "GITLAB_REF", default_value = "main", global = true)]
    pub gitlab_ref: String,

    /// Include error details in 500 responses
    #[arg(long, env = "DOCDESK_DEV", global = true)]
    pub dev: bool,

    /// Timeout for calls to GitLab and the AI backend, in seconds
    #[arg(long, env = "DOCDESK_UPSTREAM_TIMEOUT", default_value_t = 30, global = true)]
    pub upstream_timeout_secs: u64,
}

impl AppConfig {
    pub fn docs_config(&self) -> DocsConfig {
        DocsConfig::with_root(&self.docs_root)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }

    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            docs_root: PathBuf::from("../docs"),
            backend_url: ai::DEFAULT_BACKEND_URL.to_string(),
            gitlab_api: gitlab::DEFAULT_API_BASE.to_string(),
            gitlab_ref: "main".to_string(),
            dev: false,
            upstream_timeout_secs: 30,
        }
    }
}
