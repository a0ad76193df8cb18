//! Paper metadata and source bundle models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized metadata for a single arXiv paper.
///
/// This is the standardized shape every consumer works with, regardless of
/// what the Atom feed looked like. Optional fields are present only when the
/// arXiv API supplied them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Canonical arXiv identifier
    pub arxiv_id: String,

    /// Paper title (whitespace-trimmed)
    pub title: String,

    /// Authors in the order the feed declares them
    pub authors: Vec<String>,

    /// Abstract text (whitespace-trimmed)
    pub r#abstract: String,

    /// Publication date as reported by arXiv (ISO format)
    pub published: String,

    /// Subject categories (primary first)
    pub categories: Vec<String>,

    /// Direct PDF URL
    pub pdf_url: String,

    /// Abstract page URL
    pub abs_url: String,

    /// Author comment (pages, venue notes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Journal reference, when published elsewhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_ref: Option<String>,

    /// Digital Object Identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// When this record was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PaperRecord {
    /// Create a record with required fields; optional fields start empty.
    pub fn new(
        arxiv_id: impl Into<String>,
        title: impl Into<String>,
        pdf_url: impl Into<String>,
        abs_url: impl Into<String>,
    ) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: String::new(),
            published: String::new(),
            categories: Vec::new(),
            pdf_url: pdf_url.into(),
            abs_url: abs_url.into(),
            comment: None,
            journal_ref: None,
            doi: None,
            fetched_at: Utc::now(),
        }
    }
}

/// Builder for constructing [`PaperRecord`] values.
#[derive(Debug, Clone)]
pub struct PaperRecordBuilder {
    record: PaperRecord,
}

impl PaperRecordBuilder {
    pub fn new(
        arxiv_id: impl Into<String>,
        title: impl Into<String>,
        pdf_url: impl Into<String>,
        abs_url: impl Into<String>,
    ) -> Self {
        Self {
            record: PaperRecord::new(arxiv_id, title, pdf_url, abs_url),
        }
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.record.authors = authors;
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.record.r#abstract = text.into();
        self
    }

    pub fn published(mut self, date: impl Into<String>) -> Self {
        self.record.published = date.into();
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.record.categories = categories;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.record.comment = Some(comment.into());
        self
    }

    pub fn journal_ref(mut self, journal_ref: impl Into<String>) -> Self {
        self.record.journal_ref = Some(journal_ref.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = Some(doi.into());
        self
    }

    pub fn build(self) -> PaperRecord {
        self.record
    }
}

/// Unpacked LaTeX source for one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBundle {
    /// Canonical arXiv identifier
    pub arxiv_id: String,

    /// Every `*.tex` file concatenated, each preceded by a
    /// `% File: <relpath>` provenance marker
    pub latex: String,

    /// All extracted files, keyed by path relative to the bundle root
    pub files: HashMap<String, String>,
}

impl SourceBundle {
    /// Number of `.tex` files in the bundle.
    pub fn tex_file_count(&self) -> usize {
        self.files.keys().filter(|p| p.ends_with(".tex")).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let record = PaperRecordBuilder::new(
            "1706.03762",
            "Attention Is All You Need",
            "http://arxiv.org/pdf/1706.03762",
            "http://arxiv.org/abs/1706.03762",
        )
        .authors(vec!["Ashish Vaswani".into(), "Noam Shazeer".into()])
        .abstract_text("The dominant sequence transduction models...")
        .published("2017-06-12T17:57:34Z")
        .categories(vec!["cs.CL".into(), "cs.LG".into()])
        .comment("15 pages, 5 figures")
        .build();

        assert_eq!(record.arxiv_id, "1706.03762");
        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.authors[0], "Ashish Vaswani");
        assert_eq!(record.comment.as_deref(), Some("15 pages, 5 figures"));
        assert!(record.doi.is_none());
    }

    #[test]
    fn optional_fields_omitted_from_json() {
        let record = PaperRecord::new("2301.00001", "T", "http://p", "http://a");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("comment").is_none());
        assert!(json.get("doi").is_none());
    }

    #[test]
    fn tex_file_count_ignores_other_files() {
        let mut files = HashMap::new();
        files.insert("main.tex".to_string(), String::new());
        files.insert("fig/plot.pdf".to_string(), String::new());
        files.insert("appendix.tex".to_string(), String::new());
        let bundle = SourceBundle {
            arxiv_id: "2301.00001".into(),
            latex: String::new(),
            files,
        };
        assert_eq!(bundle.tex_file_count(), 2);
    }
}
