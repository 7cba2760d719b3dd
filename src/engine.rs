//! The answer engine: document state, prompt assembly, and answering.
//!
//! An [`AnswerEngine`] targets one document path and moves between two
//! states:
//!
//! ```text
//!                initialize(force) ok
//!  Uninitialized ────────────────────▶ Ready(Arc<Document>)
//!        ▲                                   │
//!        └────── initialize(true) fails ─────┘
//! ```
//!
//! [`AnswerEngine::query`] never fails outward. Load failures, answerer
//! errors and timeouts all come back as an [`Answer`] with `error` set, so
//! the service boundary always has something to render.
//!
//! Locking: `initialize` holds the state write lock for the whole load, so
//! reloads are serialized and never observed half-done. A query takes the
//! read lock only long enough to snapshot the document (and, for the
//! chunked strategy, to search the store), then calls the answerer without
//! holding any lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::answerer::Answerer;
use crate::chunk::chunk_text;
use crate::config::{Config, RetrievalStrategy};
use crate::embedding::EmbeddingProvider;
use crate::error::{PipelineError, Result};
use crate::loader::Loader;
use crate::store::{ChunkMetadata, ContextStore, InMemoryContextStore, ScoredChunk};

/// Instructions prepended to every prompt unless overridden by
/// `answerer.system_prompt`.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are an AI assistant that answers questions about a person based on their resume.
You should respond in a friendly, professional manner as if you are representing this person.
Use the provided resume content to answer questions accurately.

CRITICAL INSTRUCTIONS:
- Speak in first person as if you ARE the person whose resume this is.
- ALWAYS include specific dates, durations, percentages, and numbers from the resume when answering.
- When discussing experience or education, ALWAYS mention the exact dates found in the resume.
- NOTE: Due to PDF formatting, dates may appear at the END of the document, NOT next to the job title they belong to.
- Look for date patterns throughout the ENTIRE document, especially at the end.";

pub const LOAD_FAILURE_ANSWER: &str = "Sorry, I couldn't load the resume data. Please try again.";

/// Appended to the context preview.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// A loaded, normalized document. Immutable once built.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    /// Length in characters, not bytes.
    pub char_len: usize,
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(path: PathBuf, text: String) -> Self {
        Self {
            path,
            char_len: text.chars().count(),
            text,
            loaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitStatus {
    Success,
    Error,
}

/// Result of [`AnswerEngine::initialize`].
#[derive(Debug, Clone, Serialize)]
pub struct InitOutcome {
    pub status: InitStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
}

impl InitOutcome {
    fn loaded(content_length: usize) -> Self {
        Self {
            status: InitStatus::Success,
            message: format!(
                "Successfully loaded resume ({} characters)",
                content_length
            ),
            content_length: Some(content_length),
        }
    }

    fn already(content_length: usize) -> Self {
        Self {
            status: InitStatus::Success,
            message: "Already initialized".to_string(),
            content_length: Some(content_length),
        }
    }

    fn failed(err: &PipelineError) -> Self {
        Self {
            status: InitStatus::Error,
            message: err.to_string(),
            content_length: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InitStatus::Success
    }
}

/// Response to a question. `error` is set whenever `answer` is an apology.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<String>,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Answer {
    fn failed(question: &str, answer: String, error: String) -> Self {
        Self {
            answer,
            context: Vec::new(),
            question: question.to_string(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub initialized: bool,
    pub content_length: usize,
    pub document_path: PathBuf,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Tunables shared by every engine a session creates.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub instructions: String,
    /// Bound on each answerer / embedding call.
    pub timeout: Duration,
    pub preview_chars: usize,
    pub strategy: RetrievalStrategy,
    pub default_context_chunks: usize,
    pub chunk_max_tokens: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            instructions: config
                .answerer
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            timeout: Duration::from_secs(config.answerer.timeout_secs),
            preview_chars: config.retrieval.preview_chars,
            strategy: config.retrieval.strategy,
            default_context_chunks: config.retrieval.context_chunks,
            chunk_max_tokens: config.retrieval.max_tokens,
        }
    }
}

/// Builds a fresh, empty context store for each engine.
pub type StoreFactory = Arc<dyn Fn() -> Arc<dyn ContextStore> + Send + Sync>;

/// The capabilities an engine is built from.
#[derive(Clone)]
pub struct EngineComponents {
    pub loader: Arc<dyn Loader>,
    pub answerer: Arc<dyn Answerer>,
    /// Required when `options.strategy` is chunked.
    pub store_factory: Option<StoreFactory>,
    pub options: EngineOptions,
}

impl EngineComponents {
    /// Give each engine its own in-memory store backed by `provider`.
    pub fn with_embeddings(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let factory: StoreFactory = Arc::new(move || {
            Arc::new(InMemoryContextStore::new("resume", provider.clone())) as Arc<dyn ContextStore>
        });
        self.store_factory = Some(factory);
        self
    }
}

enum EngineState {
    Uninitialized,
    Ready(Arc<Document>),
}

/// Context selected for one question.
struct Grounding {
    document: Arc<Document>,
    excerpts: Option<Vec<ScoredChunk>>,
}

pub struct AnswerEngine {
    document_path: PathBuf,
    loader: Arc<dyn Loader>,
    answerer: Arc<dyn Answerer>,
    store: Option<Arc<dyn ContextStore>>,
    options: EngineOptions,
    state: RwLock<EngineState>,
}

impl AnswerEngine {
    /// Create an uninitialized engine for `document_path`.
    ///
    /// The context store is only built for the chunked strategy.
    pub fn new(document_path: PathBuf, components: &EngineComponents) -> Self {
        let store = match (components.options.strategy, &components.store_factory) {
            (RetrievalStrategy::Chunked, Some(factory)) => Some(factory()),
            _ => None,
        };
        Self {
            document_path,
            loader: components.loader.clone(),
            answerer: components.answerer.clone(),
            store,
            options: components.options.clone(),
            state: RwLock::new(EngineState::Uninitialized),
        }
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Load the document unless already loaded (or `force_reload`).
    ///
    /// Failures are reported in the returned outcome and leave the engine
    /// uninitialized.
    pub async fn initialize(&self, force_reload: bool) -> InitOutcome {
        let mut state = self.state.write().await;
        if let EngineState::Ready(doc) = &*state {
            if !force_reload {
                return InitOutcome::already(doc.char_len);
            }
        }

        match self.load_document().await {
            Ok(doc) => {
                tracing::info!(
                    path = %doc.path.display(),
                    chars = doc.char_len,
                    loaded_at = %doc.loaded_at,
                    "resume loaded"
                );
                let outcome = InitOutcome::loaded(doc.char_len);
                *state = EngineState::Ready(doc);
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.document_path.display(),
                    error = %e,
                    "resume load failed"
                );
                *state = EngineState::Uninitialized;
                InitOutcome::failed(&e)
            }
        }
    }

    async fn load_document(&self) -> Result<Arc<Document>> {
        let loader = self.loader.clone();
        let path = self.document_path.clone();
        let text = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| PipelineError::Pdf(format!("loader task failed: {}", e)))??;

        if text.is_empty() {
            return Err(PipelineError::EmptyExtraction);
        }

        let doc = Arc::new(Document::new(self.document_path.clone(), text));
        if let Some(store) = &self.store {
            self.index(store.as_ref(), &doc).await?;
        }
        Ok(doc)
    }

    /// Replace the store contents with the document's chunks.
    async fn index(&self, store: &dyn ContextStore, doc: &Document) -> Result<()> {
        store.clear().await.map_err(PipelineError::upstream)?;
        let (metadatas, texts): (Vec<ChunkMetadata>, Vec<String>) =
            chunk_text(&doc.text, self.options.chunk_max_tokens)
                .into_iter()
                .map(|c| (ChunkMetadata::resume(c.index), c.text))
                .unzip();
        let ids = self
            .bounded(store.add_chunks(&texts, Some(metadatas)))
            .await?;
        tracing::debug!(
            path = %doc.path.display(),
            chunks = ids.len(),
            "indexed resume chunks"
        );
        Ok(())
    }

    /// Answer `question` from the loaded document, loading it first if
    /// needed. Always returns an [`Answer`].
    pub async fn query(&self, question: &str, context_chunks: Option<usize>) -> Answer {
        let k = context_chunks.unwrap_or(self.options.default_context_chunks);

        // One snapshot decides the path: a reload that fails between the
        // readiness check and the snapshot must surface as a load failure.
        let grounding = match self.ground(question, k).await {
            Err(PipelineError::NoDocumentLoaded) => {
                let outcome = self.initialize(false).await;
                if !outcome.is_success() {
                    return Answer::failed(
                        question,
                        LOAD_FAILURE_ANSWER.to_string(),
                        outcome.message,
                    );
                }
                self.ground(question, k).await
            }
            other => other,
        };

        let result = match grounding {
            Ok(grounding) => {
                let prompt = self.build_prompt(&grounding, question);
                self.bounded(self.answerer.generate(&prompt))
                    .await
                    .map(|text| (text, grounding))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok((text, grounding)) => Answer {
                answer: text,
                context: self.context_preview(&grounding),
                question: question.to_string(),
                error: None,
            },
            Err(PipelineError::NoDocumentLoaded) => {
                tracing::warn!("resume unloaded while answering");
                Answer::failed(
                    question,
                    LOAD_FAILURE_ANSWER.to_string(),
                    "resume was unloaded by a concurrent reload".to_string(),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "answer generation failed");
                Answer::failed(
                    question,
                    format!("Sorry, I encountered an error: {}", e),
                    e.to_string(),
                )
            }
        }
    }

    /// Snapshot the document and, for the chunked strategy, pick the
    /// nearest chunks. The read lock keeps a concurrent reload from
    /// swapping the store mid-search.
    async fn ground(&self, question: &str, k: usize) -> Result<Grounding> {
        let state = self.state.read().await;
        let document = match &*state {
            EngineState::Ready(doc) => doc.clone(),
            EngineState::Uninitialized => return Err(PipelineError::NoDocumentLoaded),
        };
        let excerpts = match &self.store {
            Some(store) => Some(self.bounded(store.search(question, k)).await?),
            None => None,
        };
        Ok(Grounding { document, excerpts })
    }

    fn build_prompt(&self, grounding: &Grounding, question: &str) -> String {
        match &grounding.excerpts {
            None => format!(
                "{}\n\n=== MY RESUME ===\n{}\n=== END RESUME ===\n\nUSER QUESTION: {}\n\n\
                 Please answer the question based on my resume above. \
                 If the information isn't available, say so politely.",
                self.options.instructions, grounding.document.text, question
            ),
            Some(chunks) => {
                let excerpts = chunks
                    .iter()
                    .map(|c| c.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n---\n\n");
                format!(
                    "{}\n\n=== RELEVANT RESUME EXCERPTS ===\n{}\n=== END EXCERPTS ===\n\nUSER QUESTION: {}\n\n\
                     Please answer the question based on the resume excerpts above. \
                     If the information isn't available, say so politely.",
                    self.options.instructions, excerpts, question
                )
            }
        }
    }

    fn context_preview(&self, grounding: &Grounding) -> Vec<String> {
        match &grounding.excerpts {
            None => vec![preview(&grounding.document.text, self.options.preview_chars)],
            Some(chunks) => chunks.iter().map(|c| c.content.clone()).collect(),
        }
    }

    /// Run an upstream call under the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: std::future::Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::upstream(e)),
            Err(_) => Err(PipelineError::Timeout(self.options.timeout)),
        }
    }

    pub async fn status(&self) -> EngineStatus {
        let state = self.state.read().await;
        let (initialized, content_length, loaded_at) = match &*state {
            EngineState::Ready(doc) => (true, doc.char_len, Some(doc.loaded_at)),
            EngineState::Uninitialized => (false, 0, None),
        };
        EngineStatus {
            initialized,
            content_length,
            document_path: self.document_path.clone(),
            loaded_at,
        }
    }
}

/// First `max_chars` characters of `text` followed by [`PREVIEW_ELLIPSIS`].
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(PREVIEW_ELLIPSIS);
    out
}
