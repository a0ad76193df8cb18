//! arXiv integration: identifier handling, the Atom metadata API, and
//! e-print source retrieval.

mod client;
mod eprint;
mod id;
mod metadata;

pub use client::ArxivClient;
pub use eprint::SourceRetriever;
pub use id::ArxivId;
pub use metadata::MetadataFetcher;
