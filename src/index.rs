//! Persistent vector index over document chunks.
//!
//! Chunks and their embeddings live in a SQLite database under
//! `storage.index_dir`. Writes for one document happen in a single
//! transaction, so a document's chunks are either all visible or none are.
//! Similarity search is a brute-force cosine scan computed in Rust.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::db;
use crate::embedding;
use crate::migrate;
use crate::models::{Chunk, ScoredChunk};

#[derive(Clone)]
pub struct VectorIndex {
    pool: SqlitePool,
}

impl VectorIndex {
    /// Open the index at `path`, creating the file and schema if missing.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Replace every chunk stored for `source` with `chunks` and their vectors.
    ///
    /// `vectors[i]` is the embedding of `chunks[i]`. Runs in one transaction.
    pub async fn replace_document(
        &self,
        source: &str,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        if chunks.len() != vectors.len() {
            anyhow::bail!(
                "{} chunks but {} vectors for {}",
                chunks.len(),
                vectors.len(),
                source
            );
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM chunk_vectors WHERE chunk_id IN (SELECT id FROM chunks WHERE source = ?)",
        )
        .bind(source)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM chunks WHERE source = ?")
            .bind(source)
            .execute(&mut *tx)
            .await?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, page, chunk_index, start_offset, text, hash, indexed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(source)
            .bind(chunk.page.map(i64::from))
            .bind(chunk.chunk_index)
            .bind(chunk.start as i64)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO chunk_vectors (chunk_id, model, dims, embedding) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(model)
            .bind(vector.len() as i64)
            .bind(embedding::vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Checkpoint the write-ahead log into the main database file.
    pub async fn flush(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Return the `k` chunks most similar to `query_vec` among vectors
    /// produced by `model`, best first. Equal scores keep insertion order.
    pub async fn search(&self, query_vec: &[f32], k: usize, model: &str) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.source, c.page, c.text, cv.embedding
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            WHERE cv.model = ?
            ORDER BY c.rowid
            "#,
        )
        .bind(model)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = embedding::blob_to_vec(&blob);
                let page: Option<i64> = row.get("page");
                ScoredChunk {
                    chunk_id: row.get("id"),
                    source: row.get("source"),
                    page: page.map(|p| p as u32),
                    text: row.get("text"),
                    score: embedding::cosine_similarity(query_vec, &vec),
                }
            })
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of chunks currently indexed.
    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Chunk texts stored for `source`, in chunk order.
    pub async fn chunk_texts(&self, source: &str) -> Result<Vec<String>> {
        let texts: Vec<String> =
            sqlx::query_scalar("SELECT text FROM chunks WHERE source = ? ORDER BY chunk_index")
                .bind(source)
                .fetch_all(&self.pool)
                .await?;
        Ok(texts)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_pages;
    use crate::models::Page;

    fn chunks_for(source: &str, texts: &[&str]) -> Vec<Chunk> {
        let pages: Vec<Page> = texts
            .iter()
            .map(|t| Page {
                number: None,
                text: t.to_string(),
            })
            .collect();
        chunk_pages(source, &pages, 500, 50)
    }

    async fn open_temp() -> (tempfile::TempDir, VectorIndex) {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(&dir.path().join("idx").join("index.sqlite"))
            .await
            .unwrap();
        (dir, index)
    }

    #[tokio::test]
    async fn test_empty_index_search_returns_nothing() {
        let (_dir, index) = open_temp().await;
        let hits = index.search(&[1.0, 0.0], 4, "m").await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_cosine() {
        let (_dir, index) = open_temp().await;
        let chunks = chunks_for("a.txt", &["north", "east", "north-east"]);
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]];
        index
            .replace_document("a.txt", &chunks, &vectors, "m")
            .await
            .unwrap();

        let hits = index.search(&[0.0, 1.0], 2, "m").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "north");
        assert_eq!(hits[1].text, "north-east");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let (_dir, index) = open_temp().await;
        let first = chunks_for("a.txt", &["first", "second"]);
        index
            .replace_document("a.txt", &first, &[vec![1.0, 0.0], vec![1.0, 0.0]], "m")
            .await
            .unwrap();
        let later = chunks_for("b.txt", &["third", "off-axis"]);
        index
            .replace_document("b.txt", &later, &[vec![2.0, 0.0], vec![0.0, 1.0]], "m")
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 4, "m").await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third", "off-axis"]);
        assert_eq!(hits[0].score, hits[2].score);
    }

    #[tokio::test]
    async fn test_search_ignores_other_models() {
        let (_dir, index) = open_temp().await;
        let chunks = chunks_for("a.txt", &["only"]);
        index
            .replace_document("a.txt", &chunks, &[vec![1.0]], "old-model")
            .await
            .unwrap();
        assert!(index.search(&[1.0], 4, "new-model").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_document_does_not_duplicate() {
        let (_dir, index) = open_temp().await;
        let first = chunks_for("a.txt", &["v1 one", "v1 two"]);
        index
            .replace_document("a.txt", &first, &[vec![1.0], vec![1.0]], "m")
            .await
            .unwrap();
        let second = chunks_for("a.txt", &["v2"]);
        index
            .replace_document("a.txt", &second, &[vec![1.0]], "m")
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.chunk_texts("a.txt").await.unwrap(), vec!["v2"]);
    }

    #[tokio::test]
    async fn test_replace_document_keeps_other_sources() {
        let (_dir, index) = open_temp().await;
        let a = chunks_for("a.txt", &["alpha"]);
        let b = chunks_for("b.txt", &["beta"]);
        index.replace_document("a.txt", &a, &[vec![1.0]], "m").await.unwrap();
        index.replace_document("b.txt", &b, &[vec![1.0]], "m").await.unwrap();
        index.replace_document("a.txt", &[], &[], "m").await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.chunk_texts("b.txt").await.unwrap(), vec!["beta"]);
    }

    #[tokio::test]
    async fn test_mismatched_vectors_write_nothing() {
        let (_dir, index) = open_temp().await;
        let chunks = chunks_for("a.txt", &["one", "two"]);
        let err = index
            .replace_document("a.txt", &chunks, &[vec![1.0]], "m")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2 chunks but 1 vectors"));
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flush_and_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.sqlite");
        {
            let index = VectorIndex::open(&path).await.unwrap();
            let chunks = chunks_for("a.txt", &["kept"]);
            index.replace_document("a.txt", &chunks, &[vec![1.0]], "m").await.unwrap();
            index.flush().await.unwrap();
            index.close().await;
        }
        let index = VectorIndex::open(&path).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }
}
