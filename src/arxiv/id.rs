//! Canonical arXiv identifier handling.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CrawlError;

/// Matches a full id exactly: modern `YYMM.NNNN[N]` or legacy `cat/NNNNNNN`.
static ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{4}\.\d{4,5}|[a-z][a-z-]*(?:\.[A-Z]{2})?/\d{7})$")
        .expect("invalid arXiv id regex")
});

/// Finds an id embedded anywhere in free text (citation strings, BibTeX
/// field values). Same grammar as [`ID_RE`] without anchors.
static ID_IN_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\d{4}\.\d{4,5}|[a-z][a-z-]*(?:\.[A-Z]{2})?/\d{7})")
        .expect("invalid arXiv id scan regex")
});

/// Trailing version suffix (`v1`, `v2`, ...).
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v\d+$").expect("invalid version regex"));

/// A validated, canonical arXiv identifier.
///
/// Construction normalizes the accepted input forms to one canonical string,
/// so the visited set and node map key on a single spelling per paper:
///
/// - `2301.12345` (bare id, version suffix stripped)
/// - `arxiv:2301.12345`
/// - `https://arxiv.org/abs/2301.12345v2`
/// - `https://arxiv.org/pdf/2301.12345.pdf`
/// - legacy `math.GT/0104020` and its URL forms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArxivId(String);

impl ArxivId {
    /// Parse and normalize an id or arXiv URL.
    pub fn parse(input: &str) -> Result<Self, CrawlError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CrawlError::Validation("empty arXiv id".to_string()));
        }

        let mut candidate = input;

        // URL forms: take the path segment after /abs/ or /pdf/
        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = candidate.find(marker) {
                candidate = &candidate[pos + marker.len()..];
                break;
            }
        }

        // Strip query string, anchor, and a trailing .pdf extension
        let candidate = candidate
            .split(['?', '#'])
            .next()
            .unwrap_or(candidate)
            .trim_end_matches(".pdf");

        // Optional scheme-style prefix
        let candidate = candidate
            .strip_prefix("arXiv:")
            .or_else(|| candidate.strip_prefix("arxiv:"))
            .unwrap_or(candidate);

        let canonical = VERSION_RE.replace(candidate, "").into_owned();

        if ID_RE.is_match(&canonical) {
            Ok(ArxivId(canonical))
        } else {
            Err(CrawlError::Validation(format!(
                "invalid arXiv id or URL: {}",
                input
            )))
        }
    }

    /// Scan free text for the first embedded arXiv id.
    ///
    /// This is deliberately conservative: only a literal id-shaped substring
    /// resolves, never DOIs or fuzzy title matches.
    pub fn find_in_text(text: &str) -> Option<Self> {
        ID_IN_TEXT_RE
            .find(text)
            .map(|m| ArxivId(VERSION_RE.replace(m.as_str(), "").into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abstract page URL for this paper.
    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.0)
    }

    /// e-print (LaTeX source) URL for this paper.
    pub fn eprint_url(&self) -> String {
        format!("https://arxiv.org/e-print/{}", self.0)
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ArxivId {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_forms_normalize_to_same_id() {
        let forms = [
            "2301.12345",
            "2301.12345v3",
            "arXiv:2301.12345",
            "https://arxiv.org/abs/2301.12345",
            "https://arxiv.org/abs/2301.12345v1",
            "https://arxiv.org/pdf/2301.12345",
            "https://arxiv.org/pdf/2301.12345.pdf",
            "https://arxiv.org/abs/2301.12345?context=cs.LG",
        ];
        for form in forms {
            assert_eq!(
                ArxivId::parse(form).unwrap().as_str(),
                "2301.12345",
                "failed for input {form}"
            );
        }
    }

    #[test]
    fn legacy_ids_are_accepted() {
        assert_eq!(
            ArxivId::parse("math.GT/0104020").unwrap().as_str(),
            "math.GT/0104020"
        );
        assert_eq!(
            ArxivId::parse("https://arxiv.org/abs/hep-th/9901001")
                .unwrap()
                .as_str(),
            "hep-th/9901001"
        );
    }

    #[test]
    fn five_digit_modern_ids_are_accepted() {
        assert_eq!(ArxivId::parse("2005.00001").unwrap().as_str(), "2005.00001");
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        for bad in ["", "  ", "not-an-id", "12.34", "https://arxiv.org/", "10.1234/doi"] {
            assert!(ArxivId::parse(bad).is_err(), "accepted bad input {bad:?}");
        }
    }

    #[test]
    fn find_in_text_extracts_embedded_id() {
        let id = ArxivId::find_in_text("See arXiv:2005.00001 for details.").unwrap();
        assert_eq!(id.as_str(), "2005.00001");

        let id = ArxivId::find_in_text("preprint cs.CL/0108005, 2001").unwrap();
        assert_eq!(id.as_str(), "cs.CL/0108005");

        assert!(ArxivId::find_in_text("Smith et al., JMLR 2020").is_none());
    }

    #[test]
    fn find_in_text_strips_version() {
        let id = ArxivId::find_in_text("available as 1706.03762v5 on arXiv").unwrap();
        assert_eq!(id.as_str(), "1706.03762");
    }
}
