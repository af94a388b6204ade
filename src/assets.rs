//! Asset mirroring.
//!
//! Every regular file under the asset root whose own name does not start
//! with a dot is copied to the same relative path under the destination
//! root. Only the file name counts: directories are always descended into,
//! hidden or not.
//!
//! ```text
//! assets/                      site/
//! ├── style.css           →    ├── style.css
//! ├── .DS_Store                │   (hidden: skipped)
//! ├── .well-known/             ├── .well-known/
//! │   └── security.txt    →    │   └── security.txt
//! └── img/                     └── img/
//!     └── logo.png        →        └── logo.png
//! ```
//!
//! Copies go through [`copy_if_changed`], so an asset whose bytes are
//! already in place is never rewritten. A symlink, socket or device node in
//! the tree is an error rather than something to skip: mirroring it
//! faithfully is not possible and dropping it silently would hide the
//! problem.
//!
//! Entries are independent and are copied in parallel on the rayon pool.

use crate::output;
use crate::writer::{WriteError, WriteOutcome, copy_if_changed};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset directory {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("{0} is not a regular file")]
    NotRegularFile(PathBuf),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// One file to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Path relative to the asset root.
    pub relative_path: PathBuf,
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResult {
    pub entry: AssetEntry,
    pub outcome: WriteOutcome,
}

/// List the files under `root` that should be mirrored into `dest_root`,
/// in file-name order.
pub fn collect_assets(root: &Path, dest_root: &Path) -> Result<Vec<AssetEntry>, AssetError> {
    if !root.is_dir() {
        return Err(AssetError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;

        let file_type = entry.file_type();
        if file_type.is_dir() || is_hidden(&entry) {
            continue;
        }
        if !file_type.is_file() {
            return Err(AssetError::NotRegularFile(entry.path().to_path_buf()));
        }

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        entries.push(AssetEntry {
            destination: dest_root.join(&relative_path),
            source: entry.path().to_path_buf(),
            relative_path,
        });
    }

    Ok(entries)
}

/// Mirror `asset_root` into `dest_root`.
///
/// Stops at the first error. Results are in the same order as
/// [`collect_assets`].
pub fn sync(
    asset_root: &Path,
    dest_root: &Path,
    quiet: bool,
) -> Result<Vec<AssetResult>, AssetError> {
    collect_assets(asset_root, dest_root)?
        .into_par_iter()
        .map(|entry| -> Result<AssetResult, AssetError> {
            if let Some(parent) = entry.destination.parent() {
                fs::create_dir_all(parent).map_err(|source| AssetError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let outcome = copy_if_changed(&entry.source, &entry.destination)?;
            output::log_outcome(&entry.destination, &outcome, quiet);
            Ok(AssetResult { entry, outcome })
        })
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
