//! Citation graph construction.
//!
//! [`CitationGraphBuilder`] runs a depth-limited, breadth-first crawl over
//! any [`PaperSource`]: pop an id off the frontier, fetch its metadata and
//! LaTeX source, extract references, resolve them to further arXiv ids where
//! possible, and keep going until the frontier drains. Per-node failures are
//! recorded on the node and never abort the crawl.

pub mod mock;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::arxiv::ArxivId;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::latex;
use crate::models::{
    external_target, CitationNetwork, GraphEdge, GraphNode, PaperRecord, Reference, SourceBundle,
};

/// Anything that can supply paper metadata and LaTeX source by id.
///
/// Implemented by [`crate::arxiv::ArxivClient`] for production and by
/// [`mock::MockPaperSource`] for tests.
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperRecord, CrawlError>;

    async fn fetch_source(&self, id: &ArxivId) -> Result<SourceBundle, CrawlError>;
}

/// Handle for cancelling a running crawl from another task.
///
/// Cancellation takes effect at the next layer boundary: in-flight fetches
/// for the current layer finish, unprocessed frontier items are discarded,
/// and the partially built network is returned as-is.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Builds a [`CitationNetwork`] by breadth-first crawl.
///
/// Fetches within one BFS layer run concurrently (bounded); the next layer
/// is only enqueued once the whole current layer has been folded into the
/// graph, so every node's recorded depth is its true shortest-path distance
/// from the nearest seed.
#[derive(Debug, Clone)]
pub struct CitationGraphBuilder<S> {
    source: Arc<S>,
    max_concurrent: usize,
    fetch_timeout: Duration,
    cancel: CancelToken,
}

impl<S: PaperSource + 'static> CitationGraphBuilder<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::from_config(source, &CrawlConfig::default())
    }

    pub fn from_config(source: Arc<S>, config: &CrawlConfig) -> Self {
        Self {
            source,
            max_concurrent: config.max_concurrent.max(1),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Token that cancels this builder's crawl at the next layer boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the crawl.
    ///
    /// `seeds` must be non-empty; that is the only error this returns. All
    /// per-node fetch failures are downgraded to node-level status flags.
    pub async fn build(
        &self,
        seeds: &[ArxivId],
        max_depth: u32,
    ) -> Result<CitationNetwork, CrawlError> {
        if seeds.is_empty() {
            return Err(CrawlError::Validation("seed list is empty".to_string()));
        }

        let mut network = CitationNetwork::new(
            seeds.iter().map(|s| s.as_str().to_string()).collect(),
            max_depth,
        );
        let mut visited: HashSet<String> = HashSet::new();

        // Seeds form layer zero; duplicates collapse here.
        let mut layer: Vec<ArxivId> = Vec::new();
        for seed in seeds {
            if visited.insert(seed.as_str().to_string()) {
                network
                    .nodes
                    .insert(seed.as_str().to_string(), GraphNode::discovered(seed.as_str(), 0));
                layer.push(seed.clone());
            }
        }

        let mut depth = 0u32;
        while !layer.is_empty() {
            if self.cancel.is_cancelled() {
                tracing::info!(depth, discarded = layer.len(), "crawl cancelled");
                break;
            }

            tracing::debug!(depth, frontier = layer.len(), "processing layer");
            let results = self.fetch_layer(&layer).await;

            let mut next_layer = Vec::new();
            for (id, outcome) in results {
                self.fold_node(&mut network, &mut visited, &mut next_layer, id, outcome, depth);
            }

            layer = next_layer;
            depth += 1;
        }

        tracing::info!(
            nodes = network.nodes.len(),
            edges = network.edges.len(),
            errors = network.error_count(),
            "crawl complete"
        );
        Ok(network)
    }

    /// Fan out one layer's fetches, bounded by `max_concurrent`. The stream
    /// is order-preserving so a deterministic source yields a deterministic
    /// edge list.
    async fn fetch_layer(&self, layer: &[ArxivId]) -> Vec<(ArxivId, NodeFetch)> {
        stream::iter(layer.iter().cloned())
            .map(|id| {
                let source = Arc::clone(&self.source);
                let fetch_timeout = self.fetch_timeout;
                async move {
                    let outcome =
                        match tokio::time::timeout(fetch_timeout, fetch_node(source, &id)).await {
                            Ok(outcome) => outcome,
                            Err(_) => NodeFetch::failed(format!(
                                "fetch timed out after {}s",
                                fetch_timeout.as_secs()
                            )),
                        };
                    (id, outcome)
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Fold one fetched node into the graph and collect newly discovered
    /// ids for the next layer. Single-owner mutation point for `visited`.
    fn fold_node(
        &self,
        network: &mut CitationNetwork,
        visited: &mut HashSet<String>,
        next_layer: &mut Vec<ArxivId>,
        id: ArxivId,
        outcome: NodeFetch,
        depth: u32,
    ) {
        let node_id = id.as_str().to_string();

        if let Some(record) = outcome.record {
            if let Some(node) = network.nodes.get_mut(&node_id) {
                node.set_record(record);
            }
        }
        if let Some(message) = outcome.error {
            tracing::warn!(id = %node_id, error = %message, "node fetch failed");
            if let Some(node) = network.nodes.get_mut(&node_id) {
                node.set_error(message);
            }
            return;
        }

        for reference in outcome.references {
            let citation = reference.citation_text();
            let target = match ArxivId::find_in_text(&citation) {
                Some(target_id) => {
                    let target = target_id.as_str().to_string();
                    if depth + 1 <= network.max_depth && visited.insert(target.clone()) {
                        network
                            .nodes
                            .insert(target.clone(), GraphNode::discovered(&target, depth + 1));
                        next_layer.push(target_id);
                    }
                    target
                }
                // No id-shaped substring: a permanent leaf, never enqueued.
                None => external_target(&reference.key),
            };

            network.edges.push(GraphEdge {
                source: node_id.clone(),
                target,
                citation,
            });
        }
    }
}

/// Result of fetching one node: metadata, extracted references, or the
/// failure message to record on the node.
#[derive(Debug)]
struct NodeFetch {
    record: Option<PaperRecord>,
    references: Vec<Reference>,
    error: Option<String>,
}

impl NodeFetch {
    fn failed(message: String) -> Self {
        Self {
            record: None,
            references: Vec::new(),
            error: Some(message),
        }
    }
}

/// Fetch metadata then source for one node. A metadata failure leaves the
/// record empty; a source failure after successful metadata keeps the
/// partial record but still marks the node errored.
async fn fetch_node<S: PaperSource>(source: Arc<S>, id: &ArxivId) -> NodeFetch {
    let record = match source.fetch_metadata(id).await {
        Ok(record) => record,
        Err(e) => return NodeFetch::failed(e.to_string()),
    };

    match source.fetch_source(id).await {
        Ok(bundle) => NodeFetch {
            record: Some(record),
            references: latex::parse(&bundle.latex),
            error: None,
        },
        Err(e) => NodeFetch {
            record: Some(record),
            references: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPaperSource;
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ArxivId> {
        raw.iter().map(|s| ArxivId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn empty_seed_list_fails_fast() {
        let source = Arc::new(MockPaperSource::new());
        let builder = CitationGraphBuilder::new(source);
        let err = builder.build(&[], 1).await.unwrap_err();
        assert!(matches!(err, CrawlError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_seeds_collapse_to_one_node() {
        let source = Arc::new(MockPaperSource::new());
        source.add_paper("2301.00001", "");
        let builder = CitationGraphBuilder::new(Arc::clone(&source));

        let network = builder
            .build(&ids(&["2301.00001", "2301.00001"]), 0)
            .await
            .unwrap();
        assert_eq!(network.nodes.len(), 1);
        assert_eq!(source.fetch_count("2301.00001"), 1);
    }

    #[tokio::test]
    async fn timeout_is_an_ordinary_node_error() {
        let source = Arc::new(MockPaperSource::new());
        source.add_paper("2301.00001", "");
        source.delay("2301.00001", Duration::from_millis(200));

        let builder = CitationGraphBuilder::new(Arc::clone(&source))
            .with_fetch_timeout(Duration::from_millis(10));
        let network = builder.build(&ids(&["2301.00001"]), 0).await.unwrap();

        let node = &network.nodes["2301.00001"];
        assert_eq!(node.status, crate::models::FetchStatus::Error);
        assert!(node.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn cancel_discards_unprocessed_layers() {
        let source = Arc::new(MockPaperSource::new());
        source.add_paper(
            "2301.00001",
            r"\begin{thebibliography}{1}\bibitem{b} See 2301.00002.\end{thebibliography}",
        );
        source.add_paper("2301.00002", "");

        let builder = CitationGraphBuilder::new(Arc::clone(&source));
        builder.cancel_token().cancel();

        let network = builder.build(&ids(&["2301.00001"]), 3).await.unwrap();
        // Cancelled before layer 0 ran: the seed node exists but unfetched.
        assert_eq!(network.nodes.len(), 1);
        assert!(network.edges.is_empty());
        assert_eq!(source.fetch_count("2301.00001"), 0);

        // An unfetched node must not claim a successful fetch.
        let node = &network.nodes["2301.00001"];
        assert_eq!(node.status, crate::models::FetchStatus::Pending);
        let json = serde_json::to_value(node).unwrap();
        assert_eq!(json["fetch_status"], "pending");
    }

    #[tokio::test]
    async fn completed_crawl_leaves_no_pending_nodes() {
        let source = Arc::new(MockPaperSource::new());
        source.add_paper(
            "2301.00001",
            r"\begin{thebibliography}{1}\bibitem{b} See 2301.00002.\end{thebibliography}",
        );
        source.add_paper("2301.00002", "");

        let builder = CitationGraphBuilder::new(source);
        let network = builder.build(&ids(&["2301.00001"]), 1).await.unwrap();

        assert_eq!(network.nodes.len(), 2);
        for node in network.nodes.values() {
            assert_eq!(node.status, crate::models::FetchStatus::Ok);
            assert!(node.record.is_some());
        }
    }
}
