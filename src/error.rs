//! Error taxonomy for crawl operations.

/// Errors that can occur while fetching papers or building a citation graph.
///
/// Per-node fetch failures inside a crawl are downgraded to a node-level
/// status flag by the graph builder; only input validation surfaces to the
/// caller before any network activity starts.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Invalid caller input (empty seed list, malformed id). Checked before
    /// any network activity.
    #[error("validation error: {0}")]
    Validation(String),

    /// The paper id is well-formed but arXiv has no record of it.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or HTTP failure, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed API response or unparsable payload.
    #[error("parse error: {0}")]
    Parse(String),

    /// Filesystem error while unpacking a source bundle.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::Network(_))
    }
}

impl From<reqwest::Error> for CrawlError {
    fn from(err: reqwest::Error) -> Self {
        CrawlError::Network(err.to_string())
    }
}

impl From<quick_xml::DeError> for CrawlError {
    fn from(err: quick_xml::DeError) -> Self {
        CrawlError::Parse(format!("XML: {}", err))
    }
}

impl From<serde_json::Error> for CrawlError {
    fn from(err: serde_json::Error) -> Self {
        CrawlError::Parse(format!("JSON: {}", err))
    }
}
