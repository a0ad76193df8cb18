//! High-level arXiv client combining metadata and e-print retrieval with an
//! optional write-through cache.

use async_trait::async_trait;
use std::sync::Arc;

use crate::arxiv::{ArxivId, MetadataFetcher, SourceRetriever};
use crate::config::Config;
use crate::error::CrawlError;
use crate::graph::PaperSource;
use crate::models::{PaperRecord, SourceBundle};
use crate::store::{FileStore, StoreError};
use crate::utils::HttpClient;

const PAPERS_KIND: &str = "papers";
const SOURCES_KIND: &str = "sources";

/// Production [`PaperSource`]: the arXiv Atom API for metadata and the
/// e-print endpoint for LaTeX source.
///
/// When constructed with a [`FileStore`], every fetch checks the cache
/// first and writes through on success. Cache write failures are logged
/// and otherwise ignored; a fetched record is never lost to a full disk.
pub struct ArxivClient {
    metadata: MetadataFetcher,
    eprint: SourceRetriever,
    store: Option<FileStore>,
}

impl ArxivClient {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            metadata: MetadataFetcher::new(Arc::clone(&client)),
            eprint: SourceRetriever::new(client),
            store: None,
        }
    }

    /// Build from config, attaching a file store when caching is enabled.
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        let mut arxiv = Self::new(client);
        if config.store.enabled {
            arxiv.store = Some(FileStore::new(config.store.resolved_directory()));
        }
        Ok(arxiv)
    }

    pub fn with_store(mut self, store: FileStore) -> Self {
        self.store = Some(store);
        self
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, kind: &str, id: &ArxivId) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.load(kind, id.as_str()) {
            Ok(value) => {
                tracing::debug!(id = %id, kind, "cache hit");
                Some(value)
            }
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => {
                tracing::warn!(id = %id, kind, error = %e, "cache read failed, refetching");
                None
            }
        }
    }

    fn write_through<T: serde::Serialize>(&self, kind: &str, id: &ArxivId, value: &T) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(kind, id.as_str(), value) {
                tracing::warn!(id = %id, kind, error = %e, "cache write failed");
            }
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperRecord, CrawlError> {
        if let Some(record) = self.cached(PAPERS_KIND, id) {
            return Ok(record);
        }
        let record = self.metadata.fetch(id).await?;
        self.write_through(PAPERS_KIND, id, &record);
        Ok(record)
    }

    async fn fetch_source(&self, id: &ArxivId) -> Result<SourceBundle, CrawlError> {
        if let Some(bundle) = self.cached(SOURCES_KIND, id) {
            return Ok(bundle);
        }
        let bundle = self.eprint.download(id).await?;
        self.write_through(SOURCES_KIND, id, &bundle);
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cached_miss_on_empty_store() {
        let dir = tempdir().unwrap();
        let client = Arc::new(HttpClient::new().unwrap());
        let arxiv = ArxivClient::new(client).with_store(FileStore::new(dir.path()));
        let id = ArxivId::parse("2301.00001").unwrap();
        assert!(arxiv.cached::<PaperRecord>(PAPERS_KIND, &id).is_none());
    }

    #[test]
    fn write_through_then_cached_hit() {
        let dir = tempdir().unwrap();
        let client = Arc::new(HttpClient::new().unwrap());
        let arxiv = ArxivClient::new(client).with_store(FileStore::new(dir.path()));
        let id = ArxivId::parse("2301.00001").unwrap();

        let record = PaperRecord::new(
            "2301.00001",
            "Cached",
            "https://arxiv.org/pdf/2301.00001",
            "https://arxiv.org/abs/2301.00001",
        );
        arxiv.write_through(PAPERS_KIND, &id, &record);

        let loaded: PaperRecord = arxiv.cached(PAPERS_KIND, &id).unwrap();
        assert_eq!(loaded.title, "Cached");
    }
}
