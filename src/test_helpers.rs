//! Shared test utilities for the mdpub test suite.
//!
//! Fixture builders for on-disk document trees and in-memory documents,
//! plus lookups that panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_tree(tmp.path(), &[("README.md", "[guide](guide.md)"), ("guide.md", "# Guide")]);
//! let docs = discover(&[tmp.path().join("README.md")], true).unwrap();
//! assert_eq!(paths_of(&docs, tmp.path()), vec!["README.md", "guide.md"]);
//! ```

use chrono::{TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::Document;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, content)` pairs under `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
}

/// An in-memory document with a fixed modification time
/// (2024-01-02T03:04:05Z) so rendered pages are reproducible.
pub fn document(path: impl Into<PathBuf>, content: &str) -> Document {
    Document {
        path: path.into(),
        content: content.to_string(),
        modified: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
    }
}

// =========================================================================
// Lookups and extractors
// =========================================================================

/// Document paths relative to `root`, `/`-separated, in result order.
pub fn paths_of(docs: &[Document], root: &Path) -> Vec<String> {
    docs.iter()
        .map(|d| {
            let rel = d.path.strip_prefix(root).unwrap_or_else(|_| {
                panic!("{} is not under {}", d.path.display(), root.display())
            });
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

/// Read a file as UTF-8. Panics naming the file if it is missing.
pub fn read_string(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
