//! Query → ranked chunks.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::embedding::{self, Embedder};
use crate::index::VectorIndex;
use crate::models::ScoredChunk;

/// Finds the chunks most relevant to a query, best first.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>>;
}

/// Embeds the query and runs a top-K cosine search over the vector index.
pub struct IndexRetriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        // Skip the embedding call when there is nothing to compare against.
        if self.index.count().await? == 0 {
            return Ok(Vec::new());
        }
        let query_vec = embedding::embed_query(self.embedder.as_ref(), query).await?;
        self.index
            .search(&query_vec, self.top_k, self.embedder.model_name())
            .await
    }
}
