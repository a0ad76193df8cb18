//! Citation graph types produced by a crawl.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::PaperRecord;

/// Outcome of fetching a node's metadata and source.
///
/// Nodes start `Pending` at discovery; a cancelled crawl can leave nodes in
/// that state permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Pending,
    Ok,
    Error,
}

/// One paper in the citation network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Canonical arXiv identifier
    pub arxiv_id: String,

    /// Hops from the nearest seed, fixed at first discovery
    pub depth: u32,

    /// Fetched metadata; absent when the fetch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PaperRecord>,

    #[serde(rename = "fetch_status")]
    pub status: FetchStatus,

    /// Failure detail when `status` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphNode {
    /// A freshly discovered node, before its fetch runs.
    pub fn discovered(arxiv_id: impl Into<String>, depth: u32) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            depth,
            record: None,
            status: FetchStatus::Pending,
            error: None,
        }
    }

    /// Attach fetched metadata and mark the node fetched.
    pub fn set_record(&mut self, record: PaperRecord) {
        self.record = Some(record);
        self.status = FetchStatus::Ok;
    }

    /// Mark this node's fetch as failed.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = FetchStatus::Error;
        self.error = Some(message.into());
    }
}

/// A citation from one paper to another (or to an external work).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Citing paper id
    pub source: String,

    /// Cited id: an arXiv id, or `external:<key>` when unresolvable
    pub target: String,

    /// Raw citation text the edge was derived from
    pub citation: String,
}

/// The node/edge graph produced by a crawl.
///
/// Built incrementally while the crawl runs; immutable once it completes.
/// A partially crawled network (cancelled, or with failed nodes) is still
/// a valid value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationNetwork {
    /// Nodes keyed by canonical arXiv id
    pub nodes: HashMap<String, GraphNode>,

    /// Edges in discovery order
    pub edges: Vec<GraphEdge>,

    /// Caller-supplied seed ids
    pub seeds: Vec<String>,

    /// Depth limit the crawl ran with
    pub max_depth: u32,
}

impl CitationNetwork {
    pub fn new(seeds: Vec<String>, max_depth: u32) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            seeds,
            max_depth,
        }
    }

    /// Number of nodes whose fetch failed.
    pub fn error_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.status == FetchStatus::Error)
            .count()
    }

    /// Edges originating at the given paper, in discovery order.
    pub fn edges_from(&self, arxiv_id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.source == arxiv_id).collect()
    }
}

/// Produce the `external:<key>` target id for an unresolvable citation.
/// Keys are sanitized so the synthetic id is filesystem- and JSON-friendly.
pub fn external_target(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("external:{}", sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_count_counts_failed_nodes() {
        let mut network = CitationNetwork::new(vec!["2301.00001".into()], 1);
        network
            .nodes
            .insert("2301.00001".into(), GraphNode::discovered("2301.00001", 0));
        let mut failed = GraphNode::discovered("2301.00002", 1);
        failed.set_error("connection refused");
        network.nodes.insert("2301.00002".into(), failed);

        assert_eq!(network.error_count(), 1);
    }

    #[test]
    fn node_status_tracks_fetch_lifecycle() {
        let mut node = GraphNode::discovered("2301.00001", 0);
        assert_eq!(node.status, FetchStatus::Pending);

        node.set_record(PaperRecord::new("2301.00001", "T", "http://p", "http://a"));
        assert_eq!(node.status, FetchStatus::Ok);
        assert!(node.record.is_some());
    }

    #[test]
    fn external_target_sanitizes_key() {
        assert_eq!(external_target("Smith+Jones 2020"), "external:Smith_Jones_2020");
        assert_eq!(external_target("smith2020"), "external:smith2020");
    }

    #[test]
    fn network_serializes_nodes_map_and_edge_list() {
        let mut network = CitationNetwork::new(vec!["2301.00001".into()], 0);
        network
            .nodes
            .insert("2301.00001".into(), GraphNode::discovered("2301.00001", 0));
        network.edges.push(GraphEdge {
            source: "2301.00001".into(),
            target: "external:x".into(),
            citation: "X et al.".into(),
        });

        let json = serde_json::to_value(&network).unwrap();
        assert!(json["nodes"]["2301.00001"].is_object());
        assert_eq!(json["edges"][0]["source"], "2301.00001");
        assert_eq!(json["edges"][0]["citation"], "X et al.");
    }
}
