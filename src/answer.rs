//! Retrieval-augmented answering: retrieve once, then generate from exactly
//! the retrieved chunks.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::generation::Generator;
use crate::models::SearchResponse;
use crate::retrieval::Retriever;

/// Answer returned when the index has nothing to offer.
pub const NO_DOCUMENTS_ANSWER: &str =
    "No relevant documents have been indexed yet. Upload a .pdf or .txt file first.";

pub struct AnswerService {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
}

impl AnswerService {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            bail!("query must not be empty");
        }

        let hits = self.retriever.retrieve(query).await?;
        for hit in &hits {
            tracing::debug!(
                source = %hit.source,
                page = ?hit.page,
                score = hit.score,
                text = %hit.text,
                "retrieved chunk"
            );
        }

        let retrieved_chunks: Vec<String> = hits.into_iter().map(|h| h.text).collect();
        if retrieved_chunks.is_empty() {
            return Ok(SearchResponse {
                retrieved_chunks,
                answer: NO_DOCUMENTS_ANSWER.to_string(),
            });
        }

        let answer = self.generator.generate(query, &retrieved_chunks).await?;
        tracing::info!(chunks = retrieved_chunks.len(), "answered query");

        Ok(SearchResponse {
            retrieved_chunks,
            answer,
        })
    }
}
