//! Per-document publishing.
//!
//! For each discovered document, strictly in order:
//!
//! ```text
//! raw markdown → render → sanitize → rewrite links → template → map path → gated write
//! ```
//!
//! The first three steps live in [`crate::render`], the template in
//! [`crate::template`], the write in [`crate::writer`].
//!
//! ## Destinations
//!
//! Without a destination directory a page is written next to its source
//! under its mapped name (`docs/User_Guide.md` → `docs/user-guide.html`).
//! With one, only the mapped basename is kept and every page lands directly
//! in that directory.
//!
//! ## Parallelism and collisions
//!
//! Documents share no state apart from the output namespace, so
//! [`RenderPipeline::process_all`] runs them on the rayon pool. Two sources
//! can still map to the same destination (`a/Note.md` and `b/note.md` when
//! flattened). Documents are therefore grouped by destination first: groups
//! run in parallel, the members of one group run one after another in source
//! order. The last source in sorted order wins the destination.

use crate::graph::Document;
use crate::mapping::{flatten_into, map_source_path};
use crate::output;
use crate::render::{RenderError, Renderer};
use crate::template::{Template, TemplateError};
use crate::writer::{WriteError, WriteOutcome, write_if_changed};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot render {path}: {source}")]
    Render { path: PathBuf, source: RenderError },
    #[error("cannot apply template to {path}: {source}")]
    Template { path: PathBuf, source: TemplateError },
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What publishing one document did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: WriteOutcome,
}

pub struct RenderPipeline {
    renderer: Renderer,
    template: Template,
    dest_dir: Option<PathBuf>,
    quiet: bool,
}

impl RenderPipeline {
    pub fn new(template: Template, dest_dir: Option<PathBuf>, quiet: bool) -> Self {
        Self {
            renderer: Renderer::new(),
            template,
            dest_dir,
            quiet,
        }
    }

    /// Where the page for `source` is written.
    pub fn destination(&self, source: &Path) -> PathBuf {
        let mapped = map_source_path(source);
        match &self.dest_dir {
            Some(dir) => flatten_into(dir, &mapped),
            None => mapped,
        }
    }

    /// The complete page for `document`, ready to write.
    pub fn render_page(&self, document: &Document) -> Result<String, PipelineError> {
        let body = self
            .renderer
            .render_body(&document.content)
            .map_err(|source| PipelineError::Render {
                path: document.path.clone(),
                source,
            })?;
        self.template
            .render(&body, document.modified)
            .map_err(|source| PipelineError::Template {
                path: document.path.clone(),
                source,
            })
    }

    /// Render one document and write it if its page changed.
    pub fn process(&self, document: &Document) -> Result<DocumentResult, PipelineError> {
        let page = self.render_page(document)?;
        let destination = self.destination(&document.path);
        let outcome = write_if_changed(page.as_bytes(), &destination)?;
        output::log_outcome(&destination, &outcome, self.quiet);

        Ok(DocumentResult {
            source: document.path.clone(),
            destination,
            outcome,
        })
    }

    /// Process every document on the rayon pool.
    ///
    /// Stops at the first error; pages already written stay written.
    /// Results come back sorted by source path.
    pub fn process_all(&self, documents: &[Document]) -> Result<Vec<DocumentResult>, PipelineError> {
        let mut groups: BTreeMap<PathBuf, Vec<&Document>> = BTreeMap::new();
        for document in documents {
            groups
                .entry(self.destination(&document.path))
                .or_default()
                .push(document);
        }

        for (destination, group) in &mut groups {
            group.sort_by(|a, b| a.path.cmp(&b.path));
            if group.len() > 1 {
                let sources: Vec<String> =
                    group.iter().map(|d| d.path.display().to_string()).collect();
                warn!(
                    "{} sources map to {}, keeping the last: {}",
                    group.len(),
                    destination.display(),
                    sources.join(", ")
                );
            }
        }

        let mut results: Vec<DocumentResult> = groups
            .into_par_iter()
            .map(|(_, group)| {
                group
                    .into_iter()
                    .map(|document| self.process(document))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();

        results.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(results)
    }
}
