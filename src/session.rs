//! Lifecycle controller: owns the single active [`AnswerEngine`].
//!
//! The session holds one slot with the configured document path and the
//! engine built for it. Uploads replace the engine wholesale under the
//! slot's write lock, so a query either sees the previous document or the
//! new one, never a mix. Queries clone the engine `Arc` and release the
//! lock before answering.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::answerer::create_answerer;
use crate::config::{Config, RetrievalStrategy};
use crate::embedding::create_provider;
use crate::engine::{Answer, AnswerEngine, EngineComponents, EngineOptions, InitOutcome};
use crate::error::{PipelineError, Result};
use crate::loader::PdfLoader;

struct Slot {
    document_path: Option<PathBuf>,
    engine: Option<Arc<AnswerEngine>>,
}

/// Snapshot of the session for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub initialized: bool,
    pub content_length: usize,
    pub document_path: Option<PathBuf>,
    pub has_document: bool,
}

pub struct Session {
    components: EngineComponents,
    slot: RwLock<Slot>,
}

impl Session {
    pub fn new(components: EngineComponents, document_path: Option<PathBuf>) -> Self {
        Self {
            components,
            slot: RwLock::new(Slot {
                document_path,
                engine: None,
            }),
        }
    }

    /// Build a session with the production loader and the answerer and
    /// embedder named in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut components = EngineComponents {
            loader: Arc::new(PdfLoader),
            answerer: create_answerer(&config.answerer)?,
            store_factory: None,
            options: EngineOptions::from_config(config),
        };
        if config.retrieval.strategy == RetrievalStrategy::Chunked {
            components = components.with_embeddings(create_provider(&config.embedding)?);
        }
        tracing::debug!(
            answerer = %components.answerer.model_name(),
            strategy = ?config.retrieval.strategy,
            "session ready"
        );
        Ok(Self::new(components, config.document.path.clone()))
    }

    /// Set the active document path without loading it.
    pub async fn configure(&self, path: PathBuf) {
        self.slot.write().await.document_path = Some(path);
    }

    /// Return the current engine, or build one.
    ///
    /// A `path` always yields a fresh engine for that path, replacing
    /// any existing one. Without a path the existing engine is returned,
    /// or one is built for the configured path.
    pub async fn get_or_create(&self, path: Option<PathBuf>) -> Result<Arc<AnswerEngine>> {
        let mut slot = self.slot.write().await;
        match path {
            Some(path) => Ok(self.build_engine(&mut slot, path)),
            None => {
                if let Some(engine) = &slot.engine {
                    return Ok(engine.clone());
                }
                let path = slot
                    .document_path
                    .clone()
                    .ok_or(PipelineError::NoDocumentLoaded)?;
                Ok(self.build_engine(&mut slot, path))
            }
        }
    }

    fn build_engine(&self, slot: &mut Slot, path: PathBuf) -> Arc<AnswerEngine> {
        let engine = Arc::new(AnswerEngine::new(path.clone(), &self.components));
        slot.document_path = Some(path);
        slot.engine = Some(engine.clone());
        engine
    }

    /// Replace the engine with one for `path` and force-load it while
    /// holding the slot, so no reader observes the half-built state.
    ///
    /// The new engine stays installed even when loading fails; later
    /// queries will retry the load and report the failure.
    pub async fn install(&self, path: PathBuf) -> InitOutcome {
        let mut slot = self.slot.write().await;
        let engine = self.build_engine(&mut slot, path);
        engine.initialize(true).await
    }

    /// Discard the engine. The configured path is kept.
    pub async fn reset(&self) {
        self.slot.write().await.engine = None;
        tracing::info!("session reset");
    }

    pub async fn current(&self) -> Option<Arc<AnswerEngine>> {
        self.slot.read().await.engine.clone()
    }

    pub async fn document_path(&self) -> Option<PathBuf> {
        self.slot.read().await.document_path.clone()
    }

    /// Status of the active engine. Without one the session reports no
    /// document, even if a path is configured.
    pub async fn status(&self) -> SessionStatus {
        match self.current().await {
            Some(engine) => {
                let status = engine.status().await;
                SessionStatus {
                    initialized: status.initialized,
                    content_length: status.content_length,
                    document_path: Some(status.document_path),
                    has_document: true,
                }
            }
            None => SessionStatus {
                initialized: false,
                content_length: 0,
                document_path: None,
                has_document: false,
            },
        }
    }

    /// Validate and answer a question against the active engine.
    pub async fn query(&self, question: &str, context_chunks: Option<usize>) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }
        let engine = self.current().await.ok_or(PipelineError::NoDocumentLoaded)?;
        tracing::info!(chars = question.len(), "answering question");
        Ok(engine.query(question, context_chunks).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{components, ScriptedLoader, StaticAnswerer};

    fn session(loader: Arc<ScriptedLoader>) -> Session {
        Session::new(components(loader, StaticAnswerer::new("ok")), None)
    }

    #[tokio::test]
    async fn query_without_engine_is_rejected() {
        let session = session(ScriptedLoader::always("resume"));
        let err = session.query("Skills?", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoDocumentLoaded));
        assert_eq!(err.to_string(), "Please upload a resume first");
    }

    #[tokio::test]
    async fn empty_question_is_rejected_first() {
        let session = session(ScriptedLoader::always("resume"));
        let err = session.query("   ", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Message cannot be empty");
    }

    #[tokio::test]
    async fn configure_does_not_create_engine() {
        let loader = ScriptedLoader::always("resume");
        let session = session(loader.clone());
        session.configure(PathBuf::from("a.pdf")).await;
        assert!(session.current().await.is_none());
        assert_eq!(loader.calls(), 0);
        assert!(session.query("Skills?", None).await.is_err());
    }

    #[tokio::test]
    async fn get_or_create_needs_a_path() {
        let session = session(ScriptedLoader::always("resume"));
        assert!(matches!(
            session.get_or_create(None).await,
            Err(PipelineError::NoDocumentLoaded)
        ));

        session.configure(PathBuf::from("a.pdf")).await;
        let first = session.get_or_create(None).await.unwrap();
        let again = session.get_or_create(None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let replaced = session.get_or_create(Some(PathBuf::from("b.pdf"))).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &replaced));
        assert_eq!(replaced.document_path(), PathBuf::from("b.pdf").as_path());
    }

    #[tokio::test]
    async fn install_replaces_document() {
        let loader = ScriptedLoader::sequence(vec![
            Ok("Resume A".to_string()),
            Ok("Resume B, longer".to_string()),
        ]);
        let session = session(loader);

        assert!(session.install(PathBuf::from("a.pdf")).await.is_success());
        let outcome = session.install(PathBuf::from("b.pdf")).await;
        assert_eq!(outcome.content_length, Some(16));

        let status = session.status().await;
        assert!(status.initialized);
        assert_eq!(status.content_length, 16);
        assert_eq!(status.document_path, Some(PathBuf::from("b.pdf")));
    }

    #[tokio::test]
    async fn reset_discards_engine() {
        let session = session(ScriptedLoader::always("Resume"));
        session.install(PathBuf::from("a.pdf")).await;
        session.reset().await;

        let status = session.status().await;
        assert!(!status.initialized);
        assert_eq!(status.content_length, 0);
        assert!(matches!(
            session.query("Skills?", None).await,
            Err(PipelineError::NoDocumentLoaded)
        ));
    }

    #[tokio::test]
    async fn has_document_follows_the_engine() {
        let session = session(ScriptedLoader::always("Resume"));
        session.configure(PathBuf::from("a.pdf")).await;
        let status = session.status().await;
        assert!(!status.has_document);
        assert!(status.document_path.is_none());

        session.get_or_create(None).await.unwrap();
        let status = session.status().await;
        assert!(status.has_document);
        assert!(!status.initialized);
        assert_eq!(status.document_path, Some(PathBuf::from("a.pdf")));
    }
}
