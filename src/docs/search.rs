//! Linear full-text search over a docs tree
//!
//! Every query walks the whole tree and re-reads file content; there is no
//! index. Scoring is 10 points for a filename hit plus 1 per matching line.

use async_trait::async_trait;
use regex::{NoExpand, RegexBuilder};

use crate::protocol::{FileNode, MatchKind, SearchMatch, SearchResult, StorageError};
use crate::tree;

use super::storage::DocsStorage;

const FILENAME_SCORE: u32 = 10;
const CONTENT_LINE_SCORE: u32 = 1;
const CONTEXT_RADIUS: usize = 2;

/// Source of file text for content matching
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// `Ok(None)` means the file has no searchable text.
    async fn read_text(&self, path: &str) -> Result<Option<String>, StorageError>;
}

#[async_trait]
impl ContentReader for DocsStorage {
    async fn read_text(&self, path: &str) -> Result<Option<String>, StorageError> {
        DocsStorage::read_text(self, path).await
    }
}

/// Trimmed, lower-cased query; `None` when nothing is left.
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim().to_lowercase();
    (!query.is_empty()).then_some(query)
}

/// Rank the files of `tree` against `query`.
///
/// Ties keep traversal order. An empty query returns `[]` without calling
/// `reader`.
pub async fn search_tree<R>(query: &str, tree: &[FileNode], reader: &R, limit: usize) -> Vec<SearchResult>
where
    R: ContentReader + ?Sized,
{
    let query = match normalize_query(query) {
        Some(query) => query,
        None => return Vec::new(),
    };
    let highlighter = Highlighter::new(&query);

    let mut results = Vec::new();
    for file in tree::files(tree) {
        let mut matches = Vec::new();
        let mut score = 0;

        if file.name.to_lowercase().contains(&query) {
            score += FILENAME_SCORE;
            matches.push(SearchMatch {
                kind: MatchKind::Filename,
                line: None,
                text: Some(file.name.clone()),
                context: None,
            });
        }

        match reader.read_text(&file.path).await {
            Ok(Some(content)) => {
                for found in content_matches(&content, &query, &highlighter) {
                    score += CONTENT_LINE_SCORE;
                    matches.push(found);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read {} for search: {}", file.path, e),
        }

        if !matches.is_empty() {
            results.push(SearchResult {
                file: file.clone(),
                matches,
                score,
            });
        }
    }

    // sort_by is stable, so equal scores keep traversal order
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(limit);
    results
}

fn content_matches(content: &str, query: &str, highlighter: &Highlighter) -> Vec<SearchMatch> {
    let lines: Vec<&str> = content.split('\n').collect();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(query))
        .map(|(index, line)| SearchMatch {
            kind: MatchKind::Content,
            line: Some(index + 1),
            text: Some(line.trim().to_string()),
            context: Some(context_window(&lines, index, highlighter)),
        })
        .collect()
}

/// ±2 trimmed lines around `index`, blank lines dropped, the hit quoted and
/// emphasized
fn context_window(lines: &[&str], index: usize, highlighter: &Highlighter) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(lines.len());

    (start..end)
        .filter_map(|i| {
            let line = lines[i].trim();
            if i == index {
                Some(format!("> {}", highlighter.emphasize(line)))
            } else if line.is_empty() {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Highlighter {
    pattern: Option<regex::Regex>,
    replacement: String,
}

impl Highlighter {
    fn new(query: &str) -> Self {
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok();
        Self {
            pattern,
            replacement: format!("**{}**", query),
        }
    }

    fn emphasize(&self, line: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(line, NoExpand(&self.replacement))
                .into_owned(),
            None => line.to_string(),
        }
    }
}

/// Search bound to the docs storage
#[derive(Clone)]
pub struct DocsSearch {
    storage: DocsStorage,
    limit: usize,
}

impl DocsSearch {
    pub fn new(storage: DocsStorage) -> Self {
        let limit = storage.config().search_limit;
        Self { storage, limit }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, StorageError> {
        if normalize_query(query).is_none() {
            return Ok(Vec::new());
        }
        let tree = self.storage.list().await?;
        Ok(search_tree(query, &tree, &self.storage, self.limit).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_quotes_and_emphasizes_the_hit() {
        let lines = vec!["intro", "", "Install Rust first", "then build", "", "end"];
        let context = context_window(&lines, 2, &Highlighter::new("rust"));
        assert_eq!(context, "intro\n> Install **rust** first\nthen build");
    }

    #[test]
    fn context_trims_indentation_and_carriage_returns() {
        let found = content_matches(
            "## Setup\r\n    install rust here\r\n\r\n  next step\r\n",
            "rust",
            &Highlighter::new("rust"),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text.as_deref(), Some("install rust here"));
        assert_eq!(
            found[0].context.as_deref(),
            Some("## Setup\n> install **rust** here\nnext step")
        );
    }

    #[test]
    fn highlighter_treats_query_literally() {
        let h = Highlighter::new("a.b$1");
        assert_eq!(h.emphasize("xA.B$1y axb"), "x**a.b$1**y axb");
    }

    #[test]
    fn content_matches_use_one_indexed_trimmed_lines() {
        let found = content_matches("first\n  Second match  \nthird", "match", &Highlighter::new("match"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(2));
        assert_eq!(found[0].text.as_deref(), Some("Second match"));
    }

    #[test]
    fn query_normalization() {
        assert_eq!(normalize_query("  Rust "), Some("rust".to_string()));
        assert_eq!(normalize_query(" \t "), None);
    }
}
