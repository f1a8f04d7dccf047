//! Upload-and-index pipeline.
//!
//! Coordinates one upload: format check → persist raw bytes → extract text →
//! chunk → embed → index → flush. The format check runs before anything is
//! written. Chunks are buffered and embedded in full before the index is
//! touched, and the index write is a single transaction, so a failed upload
//! never leaves a partial set of chunks behind. The raw file, once written,
//! stays on disk even if a later step fails.

use std::sync::Arc;

use crate::chunk::chunk_pages;
use crate::config::ChunkingConfig;
use crate::embedding::{self, Embedder};
use crate::error::IngestError;
use crate::extract::{extract_pages_blocking, DocumentFormat};
use crate::index::VectorIndex;
use crate::models::IngestReport;
use crate::store::DocumentStore;

pub struct Ingestor {
    documents: DocumentStore,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        documents: DocumentStore,
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            documents,
            index,
            embedder,
            chunking,
            batch_size,
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Store and index one uploaded file.
    pub async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport, IngestError> {
        let format = DocumentFormat::from_filename(filename).ok_or_else(|| {
            IngestError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;
        let name = DocumentStore::sanitize_name(filename)?;

        let replaced = self.documents.save(&name, bytes).await?;
        if replaced {
            tracing::warn!(filename = %name, "overwriting existing document with the same name");
        }

        let pages = extract_pages_blocking(bytes.to_vec(), format).await?;
        let chunks = chunk_pages(
            &name,
            &pages,
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedding::embed_batched(self.embedder.as_ref(), &texts, self.batch_size)
            .await
            .map_err(IngestError::Embedding)?;
        if vectors.len() != chunks.len() {
            return Err(IngestError::EmbeddingCount {
                expected: chunks.len(),
                got: vectors.len(),
            });
        }

        self.index
            .replace_document(&name, &chunks, &vectors, self.embedder.model_name())
            .await
            .map_err(IngestError::Index)?;
        self.index.flush().await.map_err(IngestError::Index)?;

        tracing::info!(
            filename = %name,
            pages = pages.len(),
            chunks = chunks.len(),
            "document indexed"
        );

        Ok(IngestReport {
            filename: name,
            pages: pages.len(),
            chunks: chunks.len(),
        })
    }
}
