//! One complete run.
//!
//! ```text
//! template ─┐
//! roots → discover → render pipeline → pages
//!                                   └→ asset sync (if configured)
//! ```
//!
//! The template is compiled before anything is read or written, so a
//! template with a syntax error fails the run without touching the output
//! tree. After that the first error aborts; outputs written before it stay
//! in place.

use crate::assets::{self, AssetError, AssetResult};
use crate::config::BuildConfig;
use crate::graph::{self, DiscoverError};
use crate::pipeline::{DocumentResult, PipelineError, RenderPipeline};
use crate::template::{Template, TemplateError};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("no root documents given")]
    NoRoots,
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("cannot create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Everything a successful run did, in deterministic order.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// One entry per discovered document, sorted by source path.
    pub documents: Vec<DocumentResult>,
    /// `None` when no asset directory was configured.
    pub assets: Option<Vec<AssetResult>>,
}

/// Publish the documents reachable from `config.roots`, then mirror assets.
pub fn publish(config: &BuildConfig) -> Result<PublishReport, PublishError> {
    if config.roots.is_empty() {
        return Err(PublishError::NoRoots);
    }

    let template = Template::load(&config.template)?;

    if !config.quiet {
        info!("reading input...");
    }
    let documents = graph::discover(&config.roots, config.quiet)?;

    if let Some(dir) = &config.dest_dir {
        fs::create_dir_all(dir).map_err(|source| PublishError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    if !config.quiet {
        info!("generating html...");
    }
    let pipeline = RenderPipeline::new(template, config.dest_dir.clone(), config.quiet);
    let documents = pipeline.process_all(&documents)?;

    let assets = match &config.asset_dir {
        Some(asset_dir) => {
            if !config.quiet {
                info!("scanning for assets: {}", asset_dir.display());
            }
            Some(assets::sync(
                asset_dir,
                config.asset_dest_root(),
                config.quiet,
            )?)
        }
        None => None,
    };

    Ok(PublishReport { documents, assets })
}
