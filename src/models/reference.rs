//! Bibliographic reference model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which grammar a reference was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// An `@type{key, ...}` BibTeX entry
    Bibtex,
    /// A `\bibitem{key}` entry from a thebibliography environment
    Plain,
}

/// One bibliography entry extracted from LaTeX source.
///
/// BibTeX entries carry a field map; `\bibitem` entries carry the raw
/// citation text. No lookups are performed during extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// Citation label (`\cite` key)
    pub key: String,

    pub kind: ReferenceKind,

    /// BibTeX fields (title, author, journal, year, ...); empty for plain
    /// entries. BTreeMap keeps serialized output stable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,

    /// Raw citation text for plain entries
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Reference {
    /// Create a BibTeX reference from a parsed field map.
    pub fn bibtex(key: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            key: key.into(),
            kind: ReferenceKind::Bibtex,
            fields,
            raw: String::new(),
        }
    }

    /// Create a plain `\bibitem` reference.
    pub fn plain(key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ReferenceKind::Plain,
            fields: BTreeMap::new(),
            raw: raw.into(),
        }
    }

    /// The searchable text of this reference: the raw citation string for
    /// plain entries, or every field value concatenated for BibTeX entries.
    /// This is the text scanned for embedded arXiv ids.
    pub fn citation_text(&self) -> String {
        match self.kind {
            ReferenceKind::Plain => self.raw.clone(),
            ReferenceKind::Bibtex => self
                .fields
                .values()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
