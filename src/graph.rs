//! Document discovery.
//!
//! Starting from the root documents given on the command line, discovery
//! follows every reference to another markdown file until no new documents
//! turn up. The result is the transitive closure of the reference graph.
//!
//! ## Reference tokens
//!
//! Raw markdown is scanned for bare filename-like tokens ending in `.md`.
//! Parentheses, brackets, quotes, angle brackets, backticks, asterisks and
//! whitespace all end a token, so in `[see the guide](guide.md)` only `guide.md` is a reference
//! and the bracketed display text is never glued onto it. Tokens that look
//! like remote URLs are ignored.
//!
//! Each token is resolved relative to the directory of the document that
//! contains it and normalized lexically, so `docs/../a.md` and `a.md` are
//! the same document.
//!
//! ## Ordering
//!
//! The worklist is processed FIFO and each path is read at most once, which
//! makes cycles and duplicate references harmless. The returned documents
//! are always sorted by path: output order must not depend on traversal
//! order, both for reproducible builds and for stable logs.
//!
//! A referenced document that cannot be read fails the whole discovery.
//! Bytes that are not valid UTF-8 are decoded lossily (U+FFFD) rather than
//! rejected.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("cannot read document {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// One discovered markdown source file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Normalized source path; unique key of the document.
    pub path: PathBuf,
    /// Raw file content, read once during discovery.
    pub content: String,
    /// Source modification time, passed on to the page template.
    pub modified: DateTime<Utc>,
}

impl Document {
    /// Directory the document lives in (empty for the working directory).
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

static REFERENCE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^()\[\]\s"'<>`*]+\.md\b"#).expect("valid regex"));

/// Discover the closure of `roots` under the reference graph.
///
/// `quiet` suppresses the per-document log line.
pub fn discover(roots: &[PathBuf], quiet: bool) -> Result<Vec<Document>, DiscoverError> {
    let mut queue: VecDeque<PathBuf> = roots.iter().map(|r| normalize_path(r)).collect();
    let mut found: BTreeMap<PathBuf, Document> = BTreeMap::new();

    while let Some(path) = queue.pop_front() {
        if found.contains_key(&path) {
            continue;
        }

        let document = read_document(&path)?;
        let dir = document.directory().to_path_buf();
        for token in reference_tokens(&document.content) {
            queue.push_back(resolve_reference(&dir, token));
        }

        if !quiet {
            info!("found markdown: {}", document.basename());
        }
        found.insert(path, document);
    }

    // BTreeMap iterates in key order: this is the sorted output contract.
    Ok(found.into_values().collect())
}

/// All reference tokens in raw markdown, in order of appearance.
pub fn reference_tokens(content: &str) -> Vec<&str> {
    REFERENCE_TOKEN
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|token| !token.contains("://"))
        .collect()
}

/// Lexically normalize a path: drop `.`, fold `..` into a preceding
/// normal component. Leading `..` that cannot be folded are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

fn resolve_reference(dir: &Path, token: &str) -> PathBuf {
    // A leading slash is still relative to the referencing document.
    let token = token.trim_start_matches('/');
    normalize_path(&dir.join(token))
}

fn read_document(path: &Path) -> Result<Document, DiscoverError> {
    let read_err = |source| DiscoverError::Read {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(read_err)?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(read_err)?;

    Ok(Document {
        path: path.to_path_buf(),
        content,
        modified: modified.into(),
    })
}
