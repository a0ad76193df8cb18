//! # arXiv Citegraph
//!
//! Builds citation networks from arXiv papers by crawling their LaTeX
//! sources: fetch a paper's metadata from the arXiv Atom API, download and
//! unpack its e-print tarball, extract the bibliography (BibTeX entries and
//! `\bibitem` commands), resolve cited arXiv ids, and recurse breadth-first
//! up to a depth limit.
//!
//! ## Architecture
//!
//! - [`arxiv`]: Identifier parsing, the Atom metadata API, e-print retrieval
//! - [`latex`]: Reference extraction from LaTeX/BibTeX source
//! - [`graph`]: The [`graph::PaperSource`] trait and breadth-first builder
//! - [`models`]: Paper, reference, and network data structures
//! - [`store`]: Optional on-disk cache of fetched records
//! - [`utils`]: HTTP client and retry helpers

pub mod arxiv;
pub mod config;
pub mod error;
pub mod graph;
pub mod latex;
pub mod models;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use arxiv::{ArxivClient, ArxivId};
pub use error::CrawlError;
pub use graph::{CitationGraphBuilder, PaperSource};
pub use models::{CitationNetwork, PaperRecord, Reference, SourceBundle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
