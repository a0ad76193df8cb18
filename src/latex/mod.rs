//! Bibliography extraction from raw LaTeX.
//!
//! Two independent grammars are handled: BibTeX `@type{key, ...}` entries
//! (anywhere in the text, typically inlined `.bib` content) and `\bibitem`
//! entries inside a `thebibliography` environment. Extraction is purely
//! syntactic; no external lookups happen here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::models::{Reference, ReferenceKind};

static BIBITEM_RE: Lazy<Regex> = Lazy::new(|| {
    // \bibitem with an optional [label] argument, then the {key}
    Regex::new(r"\\bibitem\s*(?:\[[^\]]*\])?\s*\{([^}]*)\}").expect("invalid bibitem regex")
});

const BIB_ENV_BEGIN: &str = "\\begin{thebibliography}";
const BIB_ENV_END: &str = "\\end{thebibliography}";

/// Extract every bibliography entry from concatenated LaTeX text.
///
/// The two passes run independently and their results are merged by byte
/// offset, so entries come back in document order even when a
/// `thebibliography` environment precedes inline BibTeX. No cross-grammar
/// de-duplication. Malformed entries are skipped with a warning and never
/// abort the rest of the document. An empty bibliography is a valid empty
/// result.
pub fn parse(latex: &str) -> Vec<Reference> {
    let mut entries = parse_bibtex_entries(latex);
    entries.extend(parse_bibitems(latex));
    entries.sort_by_key(|(offset, _)| *offset);
    entries.into_iter().map(|(_, reference)| reference).collect()
}

/// BibTeX pass: brace-balanced scanning of `@type{key, field = value, ...}`
/// blocks. Values may contain nested braces, so a simple regex is not enough.
/// Each reference is tagged with the byte offset of its `@`.
fn parse_bibtex_entries(latex: &str) -> Vec<(usize, Reference)> {
    let bytes = latex.as_bytes();
    let mut references = Vec::new();
    let mut pos = 0;

    while let Some(at) = latex[pos..].find('@') {
        let at = pos + at;
        pos = at + 1;

        // Entry type: one or more letters immediately after '@'
        let rest = &latex[at + 1..];
        let type_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        if type_len == 0 {
            continue;
        }
        let entry_type = &rest[..type_len];

        // Skip non-entry directives
        if entry_type.eq_ignore_ascii_case("comment") || entry_type.eq_ignore_ascii_case("preamble")
        {
            continue;
        }

        let brace_start = at + 1 + type_len;
        if bytes.get(brace_start) != Some(&b'{') {
            continue;
        }

        let Some(body) = balanced_block(latex, brace_start) else {
            tracing::warn!(
                entry_type,
                offset = at,
                "unbalanced BibTeX entry, skipping"
            );
            continue;
        };

        match parse_bibtex_body(body) {
            Some(reference) => {
                references.push((at, reference));
            }
            None => {
                tracing::warn!(entry_type, offset = at, "malformed BibTeX entry, skipping");
            }
        }
        // Balanced either way; resume after the block so nothing inside a
        // skipped body is rescanned as an entry.
        pos = brace_start + body.len() + 2;
    }

    references
}

/// Return the content between the brace at `open` and its balanced match,
/// or `None` if the braces never balance.
fn balanced_block(text: &str, open: usize) -> Option<&str> {
    debug_assert_eq!(&text[open..open + 1], "{");
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `key, field = value, ...` from the inside of an entry's braces.
fn parse_bibtex_body(body: &str) -> Option<Reference> {
    let mut parts = split_top_level(body);
    if parts.is_empty() {
        return None;
    }

    let key = parts.remove(0).trim().to_string();
    if key.is_empty() || key.contains('=') || key.contains(char::is_whitespace) {
        // The first segment must be a citation key, not a field or prose.
        return None;
    }

    let mut fields = BTreeMap::new();
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((name, value)) = part.split_once('=') else {
            // Stray token between fields; tolerate it.
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = trim_value(value.trim());
        if !name.is_empty() {
            fields.insert(name, value);
        }
    }

    Some(Reference::bibtex(key, fields))
}

/// Split on commas at brace/quote depth zero.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 => in_quotes = !in_quotes,
            ',' if depth == 0 && !in_quotes => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < body.len() {
        parts.push(&body[start..]);
    }
    parts
}

/// Strip one layer of surrounding braces or quotes from a field value and
/// collapse internal whitespace runs left by line wrapping.
fn trim_value(value: &str) -> String {
    let value = value.trim();
    let inner = if value.len() >= 2
        && ((value.starts_with('{') && value.ends_with('}'))
            || (value.starts_with('"') && value.ends_with('"')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };
    inner.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `\bibitem` pass: each entry's citation text runs until the next
/// `\bibitem` or the end of the environment. Each reference is tagged with
/// the byte offset of its `\bibitem`.
fn parse_bibitems(latex: &str) -> Vec<(usize, Reference)> {
    let mut references = Vec::new();
    let mut search_from = 0;

    while let Some(begin) = latex[search_from..].find(BIB_ENV_BEGIN) {
        let env_start = search_from + begin + BIB_ENV_BEGIN.len();
        let env_end = latex[env_start..]
            .find(BIB_ENV_END)
            .map(|i| env_start + i)
            .unwrap_or(latex.len());
        let env = &latex[env_start..env_end];

        let matches: Vec<_> = BIBITEM_RE.captures_iter(env).collect();
        for (i, cap) in matches.iter().enumerate() {
            let key = cap[1].trim().to_string();
            let text_start = cap.get(0).map(|m| m.end()).unwrap_or(0);
            let text_end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(env.len());
            let text = env[text_start..text_end].trim().to_string();
            let offset = env_start + cap.get(0).map(|m| m.start()).unwrap_or(0);
            references.push((offset, Reference::plain(key, text)));
        }

        search_from = env_end;
    }

    references
}
