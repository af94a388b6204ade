//! Source-to-destination path mapping.
//!
//! Every markdown document is published under a derived name. Only the
//! filename changes; the directory part is carried over untouched:
//!
//! - `docs/FOO_Bar.md` → `docs/foo-bar.html`
//! - `README.md` → `index.html`
//! - `notes.md` → `notes.html`
//! - `image.png` → `image.png` (not markdown, returned as-is)
//!
//! ## Rules
//!
//! 1. Runs of uppercase ASCII letters are folded to lowercase.
//! 2. A folded name of `readme.md` becomes `index.md`.
//! 3. Underscores become dashes.
//! 4. The `.md` extension becomes `.html`.
//!
//! The same mapping is used for the output file of each document and for
//! rewriting `href="*.md"` targets inside rendered HTML, which is what keeps
//! cross-document links working after publishing.

use std::path::{Path, PathBuf};

/// Extension identifying documents subject to rendering and mapping.
pub const MARKUP_EXTENSION: &str = ".md";

/// Extension of generated pages.
pub const OUTPUT_EXTENSION: &str = ".html";

/// Folded filename of the conventional repository root document.
const ROOT_DOCUMENT: &str = "readme.md";

/// Replacement for [`ROOT_DOCUMENT`].
const INDEX_DOCUMENT: &str = "index.md";

/// Map a source path (or link target) to its published name.
///
/// Pure and infallible: anything that does not end in `.md`, or whose
/// filename is nothing but the extension, is returned unchanged.
pub fn map_path(source: &str) -> String {
    let (dir, filename) = match source.rfind('/') {
        Some(pos) => source.split_at(pos + 1),
        None => ("", source),
    };

    if filename.len() <= MARKUP_EXTENSION.len() || !filename.ends_with(MARKUP_EXTENSION) {
        return source.to_string();
    }

    let mut name = fold_uppercase_runs(filename);
    if name == ROOT_DOCUMENT {
        name = INDEX_DOCUMENT.to_string();
    }
    let name = name.replace('_', "-");
    let stem = &name[..name.len() - MARKUP_EXTENSION.len()];

    format!("{dir}{stem}{OUTPUT_EXTENSION}")
}

/// [`map_path`] for filesystem paths.
pub fn map_source_path(source: &Path) -> PathBuf {
    PathBuf::from(map_path(&source.to_string_lossy()))
}

/// Destination when all pages are flattened into a single directory.
///
/// Only the basename of `mapped` survives, so two documents with the same
/// mapped basename in different directories land on the same file.
pub fn flatten_into(dest_dir: &Path, mapped: &Path) -> PathBuf {
    match mapped.file_name() {
        Some(name) => dest_dir.join(name),
        None => dest_dir.to_path_buf(),
    }
}

/// Lowercase every maximal run of `A-Z`. Non-ASCII letters are left alone.
fn fold_uppercase_runs(name: &str) -> String {
    name.chars().map(|c| c.to_ascii_lowercase()).collect()
}
