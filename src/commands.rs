//! Terminal front ends for import, search and tree listing

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::AppConfig;
use crate::docs::DocsService;
use crate::import::{ImportOptions, Importer, RemoteFile};
use crate::protocol::{FileNode, ImportState, ImportStatus, MatchKind};
use crate::relay::build_http_client;
use crate::relay::gitlab::{parse_project_path, GitLabClient};
use crate::tree;
use crate::workspace::Workspace;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import files from a GitLab repository into the docs root
    Import(ImportArgs),
    /// Search the docs root
    Search {
        /// Text to look for in file names and content
        query: String,
    },
    /// Print the docs tree
    Tree,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Repository URL, e.g. https://gitlab.com/my-org/my-repo
    #[arg(long, env = "GITLAB_REPO_URL")]
    pub repo_url: String,

    /// Personal access token
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Only import files under this repository path
    #[arg(long)]
    pub prefix: Option<String>,

    /// Folder name under codebase/ (defaults to the project path)
    #[arg(long)]
    pub repo_name: Option<String>,
}

pub async fn import(config: &AppConfig, args: ImportArgs) -> CmdResult {
    let docs = DocsService::new(config.docs_config());
    let client = GitLabClient::new(
        build_http_client(config.upstream_timeout()),
        &config.gitlab_api,
        &config.gitlab_ref,
    );
    let source = client.source(&args.repo_url, &args.token);
    let repo_name = match args.repo_name {
        Some(name) => name,
        None => parse_project_path(&args.repo_url)?,
    };

    let remote = tree::build_tree(source.list_files().await?);
    let prefix = args
        .prefix
        .as_deref()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty());
    let selection: Vec<RemoteFile> = tree::files(&remote)
        .into_iter()
        .filter(|f| match prefix {
            Some(prefix) => f.path == prefix || f.path.starts_with(&format!("{}/", prefix)),
            None => true,
        })
        .map(|f| RemoteFile::new(f.path.clone()))
        .collect();

    if selection.is_empty() {
        println!("{} No files to import.", "·".dimmed());
        return Ok(());
    }
    println!(
        "Importing {} files from {} into {}",
        selection.len(),
        repo_name.bold(),
        docs.config().root.display()
    );

    let mut workspace = Workspace::new(docs.storage().list().await?);
    let options = ImportOptions::from_config(docs.config(), Some(repo_name));
    let paths: Vec<String> = selection.iter().map(|f| f.path.clone()).collect();
    let mut reported = 0;

    let report = Importer::new(docs.storage(), &source, options)
        .run(selection, &mut workspace, |statuses| {
            while let Some(status) = statuses.get(reported).filter(|s| is_finished(s)) {
                print_status(&paths[reported], status);
                reported += 1;
            }
        })
        .await;

    println!();
    if report.failed() == 0 {
        println!("{} {}", "✓".green(), report.summary());
        Ok(())
    } else {
        eprintln!("{} {}", "✗".red(), report.summary());
        Err(format!("{} file(s) failed to import", report.failed()).into())
    }
}

fn is_finished(status: &ImportStatus) -> bool {
    matches!(status.status, ImportState::Success | ImportState::Error)
}

fn print_status(path: &str, status: &ImportStatus) {
    match (&status.status, &status.error) {
        (ImportState::Error, Some(error)) => println!("  {} {} ({})", "✗".red(), path, error.red()),
        (ImportState::Error, None) => println!("  {} {}", "✗".red(), path),
        _ => println!("  {} {}", "✓".green(), path),
    }
}

pub async fn search(config: &AppConfig, query: &str) -> CmdResult {
    let docs = DocsService::new(config.docs_config());
    let results = docs.search().search(query).await?;
    if results.is_empty() {
        println!("{} No matches for \"{}\"", "·".dimmed(), query.trim());
        return Ok(());
    }

    for result in results {
        println!("{} {}", result.file.path.bold(), format!("[{}]", result.score).dimmed());
        for found in result.matches.iter().filter(|m| m.kind == MatchKind::Content) {
            if let (Some(line), Some(text)) = (found.line, &found.text) {
                println!("  {} {}", format!("{:>4}:", line).cyan(), text);
            }
        }
    }
    Ok(())
}

pub async fn print_tree(config: &AppConfig) -> CmdResult {
    let docs = DocsService::new(config.docs_config());
    let nodes = docs.storage().list().await?;
    println!("{}", docs.config().root.display().to_string().bold());
    print_nodes(&nodes, "");
    Ok(())
}

fn print_nodes(nodes: &[FileNode], indent: &str) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        if node.is_folder() {
            println!("{}{}{}", indent, branch, node.name.blue().bold());
        } else {
            println!("{}{}{}", indent, branch, node.name);
        }
        if let Some(children) = &node.children {
            let next = format!("{}{}", indent, if last { "    " } else { "│   " });
            print_nodes(children, &next);
        }
    }
}
