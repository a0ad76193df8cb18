//! Scripted in-memory [`PaperSource`] for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::arxiv::ArxivId;
use crate::error::CrawlError;
use crate::graph::PaperSource;
use crate::models::{PaperRecord, PaperRecordBuilder, SourceBundle};

#[derive(Debug)]
struct ScriptedPaper {
    record: PaperRecord,
    latex: String,
}

/// A [`PaperSource`] whose responses are scripted up front.
///
/// Unknown ids return [`CrawlError::NotFound`]; ids registered with
/// [`fail`](Self::fail) or [`fail_source`](Self::fail_source) return a
/// network error from the corresponding call. Fetch counts are recorded so
/// tests can assert nothing is fetched twice.
#[derive(Debug, Default)]
pub struct MockPaperSource {
    papers: Mutex<HashMap<String, ScriptedPaper>>,
    metadata_failures: Mutex<HashMap<String, String>>,
    source_failures: Mutex<HashMap<String, String>>,
    delays: Mutex<HashMap<String, Duration>>,
    fetch_counts: Mutex<HashMap<String, u32>>,
}

impl MockPaperSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a paper with synthesized metadata and the given LaTeX body.
    pub fn add_paper(&self, id: &str, latex: &str) {
        let record = PaperRecordBuilder::new(
            id,
            format!("Paper {id}"),
            format!("https://arxiv.org/pdf/{id}"),
            format!("https://arxiv.org/abs/{id}"),
        )
        .build();
        self.papers.lock().unwrap().insert(
            id.to_string(),
            ScriptedPaper {
                record,
                latex: latex.to_string(),
            },
        );
    }

    /// Make `fetch_metadata` for this id fail with a network error.
    pub fn fail(&self, id: &str, message: &str) {
        self.metadata_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), message.to_string());
    }

    /// Make `fetch_source` for this id fail while metadata still succeeds.
    pub fn fail_source(&self, id: &str, message: &str) {
        self.source_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), message.to_string());
    }

    /// Delay both fetches for this id, for exercising timeouts.
    pub fn delay(&self, id: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(id.to_string(), delay);
    }

    /// How many times `fetch_metadata` was called for this id.
    pub fn fetch_count(&self, id: &str) -> u32 {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    async fn apply_delay(&self, id: &str) {
        let delay = self.delays.lock().unwrap().get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PaperSource for MockPaperSource {
    async fn fetch_metadata(&self, id: &ArxivId) -> Result<PaperRecord, CrawlError> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(id.as_str().to_string())
            .or_insert(0) += 1;

        self.apply_delay(id.as_str()).await;

        if let Some(message) = self.metadata_failures.lock().unwrap().get(id.as_str()) {
            return Err(CrawlError::Network(message.clone()));
        }
        self.papers
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|paper| paper.record.clone())
            .ok_or_else(|| CrawlError::NotFound(id.as_str().to_string()))
    }

    async fn fetch_source(&self, id: &ArxivId) -> Result<SourceBundle, CrawlError> {
        self.apply_delay(id.as_str()).await;

        if let Some(message) = self.source_failures.lock().unwrap().get(id.as_str()) {
            return Err(CrawlError::Network(message.clone()));
        }
        self.papers
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|paper| SourceBundle {
                arxiv_id: id.as_str().to_string(),
                latex: paper.latex.clone(),
                files: HashMap::from([("main.tex".to_string(), paper.latex.clone())]),
            })
            .ok_or_else(|| CrawlError::NotFound(id.as_str().to_string()))
    }
}
