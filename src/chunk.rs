//! Fixed-window text chunker with overlap.
//!
//! Splits page text into windows of at most `chunk_size` characters. Each
//! window starts `chunk_size - chunk_overlap` characters after the previous
//! one, so neighbouring chunks share `chunk_overlap` characters of context.
//! Lengths and offsets count Unicode scalar values, never bytes.
//!
//! Each chunk receives a random UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, Page};

/// A window of text and its character offset within the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub text: String,
}

/// Split `text` into overlapping windows.
///
/// The input is trimmed first; whitespace-only input yields no spans.
/// `chunk_overlap` must be smaller than `chunk_size` (enforced by config
/// validation); a larger value is clamped so the window always advances.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Span> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n_chars = bounds.len() - 1;
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(n_chars);
        spans.push(Span {
            start,
            text: text[bounds[start]..bounds[end]].to_string(),
        });
        if end == n_chars {
            break;
        }
        start += step;
    }
    spans
}

/// Chunk every page of a document, in page order.
///
/// `chunk_index` runs across the whole document; `start` is relative to the
/// page the chunk came from.
pub fn chunk_pages(
    source: &str,
    pages: &[Page],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for span in split_text(&page.text, chunk_size, chunk_overlap) {
            let index = chunks.len() as i64;
            chunks.push(make_chunk(source, page.number, index, span));
        }
    }
    chunks
}

fn make_chunk(source: &str, page: Option<u32>, index: i64, span: Span) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(span.text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source: source.to_string(),
        page,
        chunk_index: index,
        start: span.start,
        text: span.text,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Page {
        Page {
            number: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_small_text_single_chunk() {
        let spans = split_text("  Hello, world!\n", 500, 50);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        assert!(split_text("", 500, 50).is_empty());
        assert!(split_text(" \n\t ", 500, 50).is_empty());
    }

    #[test]
    fn test_exactly_chunk_size_is_one_chunk() {
        let text = "a".repeat(500);
        let spans = split_text(&text, 500, 50);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text.len(), 500);
    }

    #[test]
    fn test_offsets_advance_by_size_minus_overlap() {
        let text: String = (0..2_000)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        let spans = split_text(&text, 500, 50);

        // 0, 450, 900, 1350 (ends at 1850), 1800 (ends at 2000)
        assert_eq!(spans.len(), 5);
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.start, i * 450, "start mismatch at chunk {}", i);
            assert!(span.text.chars().count() <= 500);
        }
        for span in &spans[..spans.len() - 1] {
            assert_eq!(span.text.chars().count(), 500);
        }
        assert_eq!(spans.last().unwrap().text.chars().count(), 200);
    }

    #[test]
    fn test_neighbours_share_overlap() {
        let text: String = (0..1_200)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        let spans = split_text(&text, 500, 50);
        for pair in spans.windows(2) {
            let tail: String = pair[0].text.chars().skip(450).collect();
            let head: String = pair[1].text.chars().take(50).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "é".repeat(600);
        let spans = split_text(&text, 500, 50);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text.chars().count(), 500);
        assert_eq!(spans[1].start, 450);
        assert_eq!(spans[1].text.chars().count(), 150);
    }

    #[test]
    fn test_chunk_pages_indices_run_across_pages() {
        let pages = vec![
            Page {
                number: Some(1),
                text: "x".repeat(700),
            },
            Page {
                number: Some(2),
                text: "   ".to_string(),
            },
            Page {
                number: Some(3),
                text: "last page".to_string(),
            },
        ];
        let chunks = chunk_pages("report.pdf", &pages, 500, 50);
        assert_eq!(chunks.len(), 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.source, "report.pdf");
        }
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].page, Some(1));
        assert_eq!(chunks[1].start, 450);
        assert_eq!(chunks[2].page, Some(3));
        assert_eq!(chunks[2].start, 0);
        assert_eq!(chunks[2].text, "last page");
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = chunk_pages("a.txt", &[page("Alpha beta gamma")], 500, 50);
        let b = chunk_pages("a.txt", &[page("Alpha beta gamma")], 500, 50);
        assert_eq!(a[0].hash, b[0].hash);
        assert_ne!(a[0].id, b[0].id);
    }
}
