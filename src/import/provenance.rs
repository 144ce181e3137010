//! Provenance headers and destination paths for imported files

use chrono::{DateTime, SecondsFormat, Utc};

pub const CODEBASE_FOLDER: &str = "codebase";
pub const DEFAULT_REPO_FOLDER: &str = "imported";

/// Comment delimiters used to wrap the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Html,
    Block,
    TripleQuote,
}

impl CommentStyle {
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            CommentStyle::Html => ("<!--", "-->"),
            CommentStyle::Block => ("/*", "*/"),
            CommentStyle::TripleQuote => ("\"\"\"", "\"\"\""),
        }
    }
}

/// Header style for a file name, by extension. `None` means the file is
/// imported without a header.
pub fn comment_style(file_name: &str) -> Option<CommentStyle> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "md" | "txt" | "rst" => Some(CommentStyle::Html),
        "js" | "ts" | "java" | "cpp" | "c" | "go" | "rs" => Some(CommentStyle::Block),
        "py" => Some(CommentStyle::TripleQuote),
        _ => None,
    }
}

pub fn header(style: CommentStyle, original_path: &str, imported_at: DateTime<Utc>) -> String {
    let (start, end) = style.delimiters();
    format!(
        "{start}\nImported from GitLab Repository\nOriginal Path: {path}\nImport Date: {date}\n{end}\n\n",
        start = start,
        path = original_path,
        date = imported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        end = end,
    )
}

/// `content` with the provenance header for `file_name` prepended, if any
pub fn with_provenance(
    file_name: &str,
    original_path: &str,
    content: &str,
    imported_at: DateTime<Utc>,
) -> String {
    match comment_style(file_name) {
        Some(style) => header(style, original_path, imported_at) + content,
        None => content.to_string(),
    }
}

/// Replace everything outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_repo_name(repo_name: &str) -> String {
    repo_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `codebase/<sanitized repo>/<file path>`; the file path is kept as is.
pub fn import_destination(repo_name: Option<&str>, file_path: &str) -> String {
    let repo_folder = repo_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(sanitize_repo_name)
        .unwrap_or_else(|| DEFAULT_REPO_FOLDER.to_string());
    format!(
        "{}/{}/{}",
        CODEBASE_FOLDER,
        repo_folder,
        file_path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn python_uses_triple_quotes() {
        let out = with_provenance("app.py", "src/app.py", "print(1)\n", at());
        assert_eq!(
            out,
            "\"\"\"\nImported from GitLab Repository\nOriginal Path: src/app.py\nImport Date: 2024-05-01T12:30:00.000Z\n\"\"\"\n\nprint(1)\n"
        );
    }

    #[test]
    fn markdown_uses_html_comment() {
        let out = with_provenance("README.MD", "README.MD", "# Hi", at());
        assert!(out.starts_with("<!--\nImported from GitLab Repository\n"));
        assert!(out.ends_with("-->\n\n# Hi"));
    }

    #[test]
    fn c_family_uses_block_comment_and_unknown_gets_none() {
        assert_eq!(comment_style("main.rs"), Some(CommentStyle::Block));
        assert_eq!(comment_style("index.ts"), Some(CommentStyle::Block));
        assert_eq!(comment_style("package.json"), None);
        assert_eq!(comment_style("Makefile"), None);
        assert_eq!(with_provenance("data.json", "data.json", "{}", at()), "{}");
    }

    #[test]
    fn destination_sanitizes_only_repo_segment() {
        assert_eq!(
            import_destination(Some("my-org/my-repo"), "src/app.py"),
            "codebase/my-org_my-repo/src/app.py"
        );
        assert_eq!(
            import_destination(Some("team x.y"), "docs/a b.md"),
            "codebase/team_x_y/docs/a b.md"
        );
        assert_eq!(import_destination(None, "a.md"), "codebase/imported/a.md");
        assert_eq!(import_destination(Some(""), "a.md"), "codebase/imported/a.md");
    }
}
