//! Text extraction for uploaded documents.
//!
//! The format is decided from the filename extension alone. PDFs are read
//! page by page so chunks can remember where they came from; text files
//! become a single page.

use std::path::Path;

use crate::error::ExtractError;
use crate::models::Page;

/// Document formats accepted by the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detect the format from a filename's extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.pdf` or `.txt`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" => Some(DocumentFormat::Text),
            _ => None,
        }
    }
}

/// Extract page texts from raw document bytes.
pub fn extract_pages(bytes: &[u8], format: DocumentFormat) -> Result<Vec<Page>, ExtractError> {
    match format {
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Text => extract_plain(bytes),
    }
}

/// Run [`extract_pages`] on the blocking pool.
///
/// pdf-extract panics on some structurally broken PDFs; a panic is reported
/// as [`ExtractError::Pdf`] instead of tearing down the caller's task.
pub async fn extract_pages_blocking(
    bytes: Vec<u8>,
    format: DocumentFormat,
) -> Result<Vec<Page>, ExtractError> {
    let result = tokio::task::spawn_blocking(move || {
        std::panic::catch_unwind(move || extract_pages(&bytes, format))
    })
    .await;

    match result {
        Ok(Ok(pages)) => pages,
        Ok(Err(_)) => Err(ExtractError::Pdf("malformed PDF".to_string())),
        Err(e) => Err(ExtractError::Pdf(format!("extraction task failed: {}", e))),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            number: Some(i as u32 + 1),
            text,
        })
        .collect())
}

fn extract_plain(bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(vec![Page { number: None, text }])
}
