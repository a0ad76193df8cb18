//! LaTeX source bundles from the arXiv e-print endpoint.

use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tar::Archive;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::arxiv::ArxivId;
use crate::error::CrawlError;
use crate::models::SourceBundle;
use crate::utils::{api_retry_config, with_retry, HttpClient};

/// Base URL for e-print payloads
const ARXIV_EPRINT_URL: &str = "https://arxiv.org/e-print";

/// Downloads and unpacks a paper's LaTeX source bundle.
///
/// The e-print endpoint serves either a (usually gzip'd) tarball or the raw
/// bytes of a single `.tex` file; both are handled. Extraction happens in a
/// temporary directory that is removed on every exit path.
#[derive(Debug, Clone)]
pub struct SourceRetriever {
    client: Arc<HttpClient>,
    base_url: String,
}

impl SourceRetriever {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ARXIV_EPRINT_URL.to_string(),
        }
    }

    /// Point the retriever at a different endpoint (for testing).
    pub fn with_base_url(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Download and unpack the source bundle for a paper.
    ///
    /// Fails with `NotFound` when arXiv has no source for the id and
    /// `Network` on connection problems.
    pub async fn download(&self, id: &ArxivId) -> Result<SourceBundle, CrawlError> {
        let url = format!("{}/{}", self.base_url, id.as_str());

        let client = Arc::clone(&self.client);
        let payload = with_retry(api_retry_config(), || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| CrawlError::Network(format!("e-print request failed: {}", e)))?;

                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(CrawlError::NotFound(format!("no source for {}", url)));
                }
                if !response.status().is_success() {
                    return Err(CrawlError::Network(format!(
                        "e-print endpoint returned status {}",
                        response.status()
                    )));
                }

                response
                    .bytes()
                    .await
                    .map_err(|e| CrawlError::Network(format!("failed to read payload: {}", e)))
            }
        })
        .await?;

        tracing::debug!(id = %id, bytes = payload.len(), "downloaded e-print payload");
        unpack(id, &payload)
    }
}

/// Unpack an e-print payload into a [`SourceBundle`].
///
/// Tries gzip'd tar, then plain tar; anything else is treated as the bytes
/// of a single `.tex` file, decoded with lossy UTF-8.
fn unpack(id: &ArxivId, payload: &[u8]) -> Result<SourceBundle, CrawlError> {
    // TempDir cleans up on drop, which covers every exit path below.
    let temp_dir = TempDir::new()?;

    let extracted = Archive::new(GzDecoder::new(Cursor::new(payload)))
        .unpack(temp_dir.path())
        .is_ok()
        || Archive::new(Cursor::new(payload))
            .unpack(temp_dir.path())
            .is_ok();

    let files = if extracted {
        collect_files(temp_dir.path())?
    } else {
        // Not an archive: a single TeX file served raw.
        tracing::debug!(id = %id, "payload is not a tar stream, treating as single .tex file");
        let mut files = HashMap::new();
        files.insert(
            "main.tex".to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        );
        files
    };

    let latex = concatenate_tex(&files);
    tracing::debug!(
        id = %id,
        files = files.len(),
        tex_bytes = latex.len(),
        "unpacked source bundle"
    );

    Ok(SourceBundle {
        arxiv_id: id.as_str().to_string(),
        latex,
        files,
    })
}

/// Read every regular file under `root` into a path -> content map.
/// Unreadable bytes are replaced rather than failing the whole bundle.
fn collect_files(root: &Path) -> Result<HashMap<String, String>, CrawlError> {
    let mut files = HashMap::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.path().is_file() {
            continue;
        }
        let relpath = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        match std::fs::read(entry.path()) {
            Ok(bytes) => {
                files.insert(relpath, String::from_utf8_lossy(&bytes).into_owned());
            }
            Err(e) => {
                tracing::warn!(file = %relpath, error = %e, "could not read extracted file");
            }
        }
    }
    Ok(files)
}

/// Concatenate all `.tex` files in stable path order, each preceded by a
/// provenance marker.
fn concatenate_tex(files: &HashMap<String, String>) -> String {
    let mut tex_paths: Vec<&String> = files.keys().filter(|p| p.ends_with(".tex")).collect();
    tex_paths.sort();

    let mut latex = String::new();
    for path in tex_paths {
        latex.push_str(&format!("\n% File: {}\n", path));
        latex.push_str(&files[path.as_str()]);
    }
    latex
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzipped(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn unpacks_gzipped_tarball() {
        let id = ArxivId::parse("2301.00001").unwrap();
        let tar = tarball(&[
            ("main.tex", "\\documentclass{article}"),
            ("sections/intro.tex", "\\section{Introduction}"),
            ("refs.bib", "@article{a, title={T}}"),
        ]);
        let bundle = unpack(&id, &gzipped(&tar)).unwrap();

        assert_eq!(bundle.files.len(), 3);
        assert_eq!(bundle.tex_file_count(), 2);
        assert!(bundle.latex.contains("% File: main.tex"));
        assert!(bundle.latex.contains("% File: sections/intro.tex"));
        assert!(bundle.latex.contains("\\documentclass{article}"));
        // .bib files are in the map but not the concatenation
        assert!(!bundle.latex.contains("% File: refs.bib"));
    }

    #[test]
    fn unpacks_plain_tarball() {
        let id = ArxivId::parse("2301.00001").unwrap();
        let tar = tarball(&[("paper.tex", "content")]);
        let bundle = unpack(&id, &tar).unwrap();
        assert_eq!(bundle.files["paper.tex"], "content");
    }

    #[test]
    fn non_archive_payload_becomes_single_tex_file() {
        let id = ArxivId::parse("2301.00001").unwrap();
        let bundle = unpack(&id, b"\\documentclass{article}\n\\begin{document}").unwrap();
        assert_eq!(bundle.files.len(), 1);
        assert!(bundle.files["main.tex"].starts_with("\\documentclass"));
        assert!(bundle.latex.contains("% File: main.tex"));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let id = ArxivId::parse("2301.00001").unwrap();
        let bundle = unpack(&id, &[0x5c, 0x74, 0xff, 0xfe, 0x65, 0x78]).unwrap();
        assert!(bundle.files["main.tex"].contains('\u{FFFD}'));
    }

    #[test]
    fn tex_concatenation_is_sorted_by_path() {
        let mut files = HashMap::new();
        files.insert("b.tex".to_string(), "bee".to_string());
        files.insert("a.tex".to_string(), "ay".to_string());
        let latex = concatenate_tex(&files);
        let a_pos = latex.find("% File: a.tex").unwrap();
        let b_pos = latex.find("% File: b.tex").unwrap();
        assert!(a_pos < b_pos);
    }

    #[tokio::test]
    async fn download_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/2301.00001")
            .with_status(404)
            .create_async()
            .await;

        let client = Arc::new(HttpClient::new().unwrap());
        let retriever = SourceRetriever::with_base_url(client, server.url());
        let err = retriever
            .download(&ArxivId::parse("2301.00001").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::NotFound(_)));
    }

    #[tokio::test]
    async fn download_unpacks_served_tarball() {
        let mut server = mockito::Server::new_async().await;
        let tar = tarball(&[("main.tex", "\\bibitem{a} A citation.")]);
        let _mock = server
            .mock("GET", "/2301.00001")
            .with_status(200)
            .with_body(gzipped(&tar))
            .create_async()
            .await;

        let client = Arc::new(HttpClient::new().unwrap());
        let retriever = SourceRetriever::with_base_url(client, server.url());
        let bundle = retriever
            .download(&ArxivId::parse("2301.00001").unwrap())
            .await
            .unwrap();
        assert!(bundle.latex.contains("\\bibitem{a}"));
    }
}
