//! Fingerprint-gated atomic writes.
//!
//! Both generated pages and mirrored assets go through this module. The
//! protocol is the same for both:
//!
//! 1. Fingerprint the new content.
//! 2. Fingerprint the existing destination by streaming it, if it exists.
//! 3. Equal fingerprints: leave the destination alone (its mtime included).
//! 4. Otherwise write a temporary file next to the destination and rename
//!    it into place, so readers never observe a truncated file.
//!
//! A missing destination is "no previous output"; any other failure while
//! reading it is an error. No temporary file is created unless the content
//! actually changed, so an up-to-date tree needs no write access at all.
//!
//! The temporary file is created in the destination's own directory with a
//! unique name, so concurrent writers to *different* destinations in the
//! same directory never collide. Writers to the *same* destination must be
//! serialized by the caller (see [`crate::pipeline`]).

use crate::fingerprint::{self, Fingerprint, Fingerprinter};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot read existing output {path}: {source}")]
    ReadExisting { path: PathBuf, source: io::Error },
    #[error("cannot read {path}: {source}")]
    Source { path: PathBuf, source: io::Error },
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{0} is not a regular file")]
    NotRegularFile(PathBuf),
}

/// What happened to a destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Content differed (or no file existed) and the file was replaced.
    Updated,
    /// Existing content already had the same fingerprint; nothing was written.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Fingerprint of the destination content after the call.
    pub fingerprint: Fingerprint,
    pub status: WriteStatus,
}

impl WriteOutcome {
    pub fn written(&self) -> bool {
        self.status == WriteStatus::Updated
    }
}

/// Write `bytes` to `dest` unless it already holds identical content.
pub fn write_if_changed(bytes: &[u8], dest: &Path) -> Result<WriteOutcome, WriteError> {
    let fingerprint = fingerprint::hash_bytes(bytes);

    if existing_fingerprint(dest)? == Some(fingerprint) {
        return Ok(WriteOutcome {
            fingerprint,
            status: WriteStatus::Unchanged,
        });
    }

    let mut tmp = temp_file_for(dest)?;
    tmp.write_all(bytes).map_err(|source| WriteError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    persist(tmp, dest)?;

    Ok(WriteOutcome {
        fingerprint,
        status: WriteStatus::Updated,
    })
}

/// Mirror the file at `src` to `dest` unless `dest` already matches.
///
/// When the destination exists the source is fingerprinted first and the
/// copy is skipped on a match. Otherwise each chunk feeds the fingerprint
/// and the temporary output at the same time, so large files are never
/// held in memory.
pub fn copy_if_changed(src: &Path, dest: &Path) -> Result<WriteOutcome, WriteError> {
    let source_err = |source| WriteError::Source {
        path: src.to_path_buf(),
        source,
    };

    let mut input = File::open(src).map_err(source_err)?;
    let metadata = input.metadata().map_err(source_err)?;
    if !metadata.is_file() {
        return Err(WriteError::NotRegularFile(src.to_path_buf()));
    }

    if let Some(existing) = existing_fingerprint(dest)? {
        let fingerprint = fingerprint::hash_reader(&mut input).map_err(source_err)?;
        if fingerprint == existing {
            return Ok(WriteOutcome {
                fingerprint,
                status: WriteStatus::Unchanged,
            });
        }
        input.seek(SeekFrom::Start(0)).map_err(source_err)?;
    }

    let mut tmp = temp_file_for(dest)?;
    let mut hasher = Fingerprinter::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(source_err(e)),
        };
        hasher.update(&buf[..n]);
        tmp.write_all(&buf[..n]).map_err(|source| WriteError::Write {
            path: dest.to_path_buf(),
            source,
        })?;
    }
    let fingerprint = hasher.finish();

    persist(tmp, dest)?;
    Ok(WriteOutcome {
        fingerprint,
        status: WriteStatus::Updated,
    })
}

fn existing_fingerprint(dest: &Path) -> Result<Option<Fingerprint>, WriteError> {
    fingerprint::hash_file(dest).map_err(|source| WriteError::ReadExisting {
        path: dest.to_path_buf(),
        source,
    })
}

fn temp_file_for(dest: &Path) -> Result<NamedTempFile, WriteError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".mdpub-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| WriteError::Write {
            path: dest.to_path_buf(),
            source,
        })
}

fn persist(tmp: NamedTempFile, dest: &Path) -> Result<(), WriteError> {
    let write_err = |source| WriteError::Write {
        path: dest.to_path_buf(),
        source,
    };

    tmp.as_file().sync_all().map_err(write_err)?;

    // Temp files are created 0600; published files should be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    tmp.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}
