//! In-memory [`ContextStore`].
//!
//! Chunks live in a `Vec` behind `std::sync::RwLock`. Search is brute-force
//! cosine distance over every stored vector, which is plenty for a single
//! resume.

use std::sync::{Arc, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::{cosine_similarity, embed_query, EmbeddingProvider};

use super::{ChunkMetadata, ContextStore, ScoredChunk};

struct StoredChunk {
    id: String,
    text: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

pub struct InMemoryContextStore {
    collection: String,
    provider: Arc<dyn EmbeddingProvider>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryContextStore {
    pub fn new(collection: impl Into<String>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collection: collection.into(),
            provider,
            chunks: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn add_chunks(
        &self,
        texts: &[String],
        metadatas: Option<Vec<ChunkMetadata>>,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let metadatas = match metadatas {
            Some(m) if m.len() != texts.len() => bail!(
                "got {} metadata entries for {} chunks",
                m.len(),
                texts.len()
            ),
            Some(m) => m,
            None => (0..texts.len()).map(ChunkMetadata::resume).collect(),
        };

        let vectors = self.provider.embed(texts).await?;
        if vectors.len() != texts.len() {
            bail!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                texts.len()
            );
        }

        // Ids are numbered from the count observed under the write lock.
        let mut stored = self.chunks.write().unwrap();
        let start = stored.len();
        let mut ids = Vec::with_capacity(texts.len());
        for (i, ((text, metadata), vector)) in
            texts.iter().zip(metadatas).zip(vectors).enumerate()
        {
            let id = format!("doc_{}", start + i);
            stored.push(StoredChunk {
                id: id.clone(),
                text: text.clone(),
                metadata,
                vector,
            });
            ids.push(id);
        }
        tracing::debug!(
            collection = %self.collection,
            added = ids.len(),
            total = stored.len(),
            "added chunks"
        );
        Ok(ids)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.chunks.read().unwrap().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.provider.as_ref(), query).await?;

        let stored = self.chunks.read().unwrap();
        let mut hits: Vec<ScoredChunk> = stored
            .iter()
            .map(|sc| ScoredChunk {
                id: sc.id.clone(),
                content: sc.text.clone(),
                metadata: sc.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query_vec, &sc.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn clear(&self) -> Result<()> {
        self.chunks.write().unwrap().clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.chunks.read().unwrap().len())
    }
}
