//! Core data models and the JSON bodies exchanged between client and backend.

use serde::{Deserialize, Serialize};

/// Text extracted from one page of a document.
///
/// Plain-text files produce a single page with `number: None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: Option<u32>,
    pub text: String,
}

/// A bounded span of a document's text, as stored in the vector index.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    /// Filename of the document the chunk was cut from.
    pub source: String,
    pub page: Option<u32>,
    /// Position of the chunk within the whole document, from 0.
    pub chunk_index: i64,
    /// Character offset of the chunk within its page text.
    pub start: usize,
    pub text: String,
    pub hash: String,
}

/// A chunk returned by similarity search, with its cosine score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub source: String,
    pub page: Option<u32>,
    pub text: String,
    pub score: f32,
}

/// Summary of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub filename: String,
    pub pages: usize,
    pub chunks: usize,
}

// ============ Wire types ============

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub uploaded_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub retrieved_chunks: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub indexed_chunks: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============ Chat ============

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "You"),
            Sender::Bot => write!(f, "Bot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}
