//! Context store abstraction for the chunked retrieval strategy.
//!
//! The [`ContextStore`] trait holds embedded text chunks for the active
//! collection and answers nearest-neighbour queries. The in-memory
//! implementation lives in [`memory`]; any other backend only needs to
//! honour the same contract:
//!
//! | Method | Contract |
//! |--------|----------|
//! | [`add_chunks`](ContextStore::add_chunks) | embed and append; ids continue from the current count |
//! | [`search`](ContextStore::search) | up to `k` chunks, closest first; empty store → empty list |
//! | [`clear`](ContextStore::clear) | drop every chunk; the store stays usable |
//! | [`count`](ContextStore::count) | number of stored chunks |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryContextStore;

/// Source attribution attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub chunk_index: usize,
}

impl ChunkMetadata {
    /// Metadata assigned when the caller supplies none.
    pub fn resume(chunk_index: usize) -> Self {
        Self {
            source: "resume".to_string(),
            chunk_index,
        }
    }
}

/// A search hit. Lower `distance` is closer (cosine distance).
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Embed `texts` and append them, returning the assigned ids.
    ///
    /// Without `metadatas`, chunk `i` of this batch gets
    /// [`ChunkMetadata::resume(i)`](ChunkMetadata::resume).
    async fn add_chunks(
        &self,
        texts: &[String],
        metadatas: Option<Vec<ChunkMetadata>>,
    ) -> Result<Vec<String>>;

    /// Return up to `k` chunks nearest to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;

    /// Remove every chunk from the active collection.
    async fn clear(&self) -> Result<()>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}
