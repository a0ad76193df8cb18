//! Paper metadata from the arXiv query API.

use serde::Deserialize;
use std::sync::Arc;

use crate::arxiv::ArxivId;
use crate::error::CrawlError;
use crate::models::{PaperRecord, PaperRecordBuilder};
use crate::utils::{api_retry_config, with_retry, HttpClient};

/// Base URL for the arXiv query API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Fetches and normalizes paper metadata from the arXiv Atom API.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: Arc<HttpClient>,
    base_url: String,
}

impl MetadataFetcher {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
        }
    }

    /// Point the fetcher at a different endpoint (for testing).
    pub fn with_base_url(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch metadata for a single paper.
    ///
    /// Fails with `NotFound` when arXiv has no entry for the id, `Network`
    /// on connection problems, and `Parse` on a malformed API response.
    pub async fn fetch(&self, id: &ArxivId) -> Result<PaperRecord, CrawlError> {
        let url = format!(
            "{}?id_list={}&max_results=1",
            self.base_url,
            urlencoding::encode(id.as_str())
        );

        let client = Arc::clone(&self.client);
        let xml = with_retry(api_retry_config(), || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move {
                let response = client
                    .get(&url)
                    .header("Accept", "application/atom+xml")
                    .send()
                    .await
                    .map_err(|e| CrawlError::Network(format!("arXiv API request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(CrawlError::Network(format!(
                        "arXiv API returned status {}",
                        response.status()
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| CrawlError::Network(format!("failed to read response: {}", e)))
            }
        })
        .await?;

        let record = parse_feed(&xml, id)?;
        tracing::debug!(id = %id, title = %record.title, "fetched paper metadata");
        Ok(record)
    }
}

/// Parse the first entry of an arXiv Atom feed into a [`PaperRecord`].
fn parse_feed(xml: &str, id: &ArxivId) -> Result<PaperRecord, CrawlError> {
    #[derive(Debug, Deserialize)]
    struct Feed {
        #[serde(rename = "entry", default)]
        entries: Vec<Entry>,
    }

    #[derive(Debug, Deserialize)]
    struct Entry {
        title: Option<String>,
        summary: Option<String>,
        published: Option<String>,
        #[serde(rename = "author", default)]
        authors: Vec<Author>,
        #[serde(rename = "link", default)]
        links: Vec<Link>,
        #[serde(rename = "category", default)]
        categories: Vec<Category>,
        // quick-xml's serde layer strips namespace prefixes, so the
        // arxiv:-namespaced elements arrive under their local names. No
        // plain Atom element at entry level shares these names.
        comment: Option<String>,
        journal_ref: Option<String>,
        doi: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Author {
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Link {
        #[serde(rename = "@href")]
        href: String,
        #[serde(rename = "@rel")]
        rel: Option<String>,
        #[serde(rename = "@type")]
        media_type: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Category {
        #[serde(rename = "@term")]
        term: String,
    }

    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| CrawlError::Parse(format!("malformed arXiv API response: {}", e)))?;

    // An empty feed for a well-formed id means arXiv has no such paper.
    let entry = feed
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| CrawlError::NotFound(format!("no paper with id {}", id)))?;

    let title = entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CrawlError::Parse("entry has no title".to_string()))?;

    let abstract_text = entry
        .summary
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| CrawlError::Parse("entry has no abstract".to_string()))?;

    let published = entry
        .published
        .as_deref()
        .ok_or_else(|| CrawlError::Parse("entry has no published date".to_string()))?;

    let pdf_url = entry
        .links
        .iter()
        .find(|l| l.media_type.as_deref() == Some("application/pdf"))
        .map(|l| l.href.clone())
        .ok_or_else(|| CrawlError::Parse("entry has no pdf link".to_string()))?;

    let abs_url = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .map(|l| l.href.clone())
        .ok_or_else(|| CrawlError::Parse("entry has no alternate link".to_string()))?;

    let mut builder = PaperRecordBuilder::new(id.as_str(), title, pdf_url, abs_url)
        .authors(entry.authors.into_iter().map(|a| a.name).collect())
        .abstract_text(abstract_text)
        .published(published)
        .categories(entry.categories.into_iter().map(|c| c.term).collect());

    if let Some(comment) = entry.comment {
        builder = builder.comment(comment);
    }
    if let Some(journal_ref) = entry.journal_ref {
        builder = builder.journal_ref(journal_ref);
    }
    if let Some(doi) = entry.doi {
        builder = builder.doi(doi);
    }

    Ok(builder.build())
}
