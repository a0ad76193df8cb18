//! Core data models for papers, references, and citation graphs.

mod graph;
mod paper;
mod reference;

pub use graph::{external_target, CitationNetwork, FetchStatus, GraphEdge, GraphNode};
pub use paper::{PaperRecord, PaperRecordBuilder, SourceBundle};
pub use reference::{Reference, ReferenceKind};
