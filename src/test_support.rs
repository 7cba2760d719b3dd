//! Fakes shared by unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::answerer::Answerer;
use crate::embedding::EmbeddingProvider;
use crate::engine::{EngineComponents, EngineOptions};
use crate::error::{PipelineError, Result};
use crate::loader::Loader;

pub fn components(loader: Arc<dyn Loader>, answerer: Arc<dyn Answerer>) -> EngineComponents {
    EngineComponents {
        loader,
        answerer,
        store_factory: None,
        options: EngineOptions::default(),
    }
}

enum Script {
    Always(String),
    Sequence(Mutex<VecDeque<Result<String>>>),
}

/// Loader returning canned text and counting calls.
pub struct ScriptedLoader {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedLoader {
    pub fn always(text: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Always(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn sequence(results: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Sequence(Mutex::new(results.into())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Loader for ScriptedLoader {
    fn load(&self, _path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Always(text) => Ok(text.clone()),
            Script::Sequence(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PipelineError::Pdf("script exhausted".to_string()))),
        }
    }
}

/// Answerer with a fixed reply that records every prompt.
pub struct StaticAnswerer {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StaticAnswerer {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Answerer for StaticAnswerer {
    fn model_name(&self) -> &str {
        "static"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingAnswerer;

#[async_trait]
impl Answerer for FailingAnswerer {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("Gemini API error 429: quota exceeded")
    }
}

/// Sleeps before answering.
pub struct SlowAnswerer(pub Duration);

#[async_trait]
impl Answerer for SlowAnswerer {
    fn model_name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        tokio::time::sleep(self.0).await;
        Ok("late".to_string())
    }
}

const VOCAB: [&str; 3] = ["python", "spark", "aws"];

/// Keyword-presence vectors plus a constant bias dimension.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword"
    }

    fn dims(&self) -> usize {
        VOCAB.len() + 1
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB
                    .iter()
                    .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}
