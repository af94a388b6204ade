//! # mdpub
//!
//! Publishes a tree of interlinked markdown documents as HTML. Give it one or
//! more root documents; it follows every reference to another `.md` file,
//! renders everything it finds, rewrites the links between documents to
//! point at the published pages, and writes each page only when its content
//! actually changed.
//!
//! # Architecture: One Pass, Three Stages
//!
//! ```text
//! 1. Discover   roots      →  sorted documents   (reference graph closure)
//! 2. Render     documents  →  pages              (markdown → safe HTML → template)
//! 3. Write      pages      →  output tree        (fingerprint-gated atomic replace)
//!               assets/    →  output tree        (same gate, streamed)
//! ```
//!
//! Nothing is persisted between runs except the output tree itself, which
//! serves as the record of the last successful output: a page whose freshly
//! rendered bytes hash to the same SHA-256 as the file on disk is not
//! touched, mtime included. Running twice on unchanged input writes nothing
//! the second time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`mapping`] | Source filename → published filename (`User_Guide.md` → `user-guide.html`, `README.md` → `index.html`) |
//! | [`fingerprint`] | SHA-256 content digests, in memory or streamed from disk |
//! | [`writer`] | Fingerprint-gated atomic writes and copies |
//! | [`graph`] | Reference discovery: transitive closure from the root documents |
//! | [`render`] | pulldown-cmark rendering, ammonia sanitizing, `.md` link rewriting |
//! | [`template`] | Tera page template receiving `body` and `date_modified` |
//! | [`pipeline`] | Per-document render → template → write, parallel on rayon |
//! | [`assets`] | Mirrors a directory of static files into the output tree |
//! | [`publish`] | One complete run wiring the stages together |
//! | [`config`] | Build settings: defaults, optional TOML file, CLI flags |
//! | [`output`] | Log lines for write decisions and the end-of-run summary |
//!
//! # Design Decisions
//!
//! ## All-or-Nothing Runs
//!
//! Every error is fatal: an unreadable document, a template typo, a symlink
//! in the asset tree. A run either succeeds completely or stops at the first
//! problem. Pages written before the failure stay written, which is safe
//! because every write is atomic and idempotent; the next good run settles
//! the tree.
//!
//! ## Deterministic Output
//!
//! Discovery returns documents sorted by path, independent of traversal
//! order. Rendering runs in parallel but results are reported in the same
//! sorted order, and when two sources map to the same page the later one in
//! sorted order wins every time.
//!
//! ## Explicit Configuration
//!
//! Settings, including `quiet`, travel in a [`config::BuildConfig`] value
//! passed to each stage. Library code reads no global flags.

pub mod assets;
pub mod config;
pub mod fingerprint;
pub mod graph;
pub mod mapping;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod template;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
