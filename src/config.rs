use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[document].path`.
pub const RESUME_PATH_ENV: &str = "RESUME_PATH";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub answerer: AnswererConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DocumentConfig {
    /// Resume to serve before anything is uploaded.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Build and initialize the engine at startup instead of on first use.
    #[serde(default)]
    pub preload: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// Uploads always overwrite this single slot.
    #[serde(default = "default_upload_file_name")]
    pub file_name: String,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            file_name: default_upload_file_name(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_upload_file_name() -> String {
    "resume.pdf".to_string()
}
fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswererConfig {
    #[serde(default = "default_answerer_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_answerer_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the built-in resume persona instructions.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AnswererConfig {
    fn default() -> Self {
        Self {
            provider: default_answerer_provider(),
            model: None,
            url: None,
            timeout_secs: default_answerer_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_answerer_provider() -> String {
    "gemini".to_string()
}
fn default_answerer_timeout_secs() -> u64 {
    60
}

impl AnswererConfig {
    /// Model name, falling back to a per-provider default.
    pub fn model_or_default(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "gemini" => "gemini-2.5-flash",
            "openai" => "gpt-4o-mini",
            "ollama" => "llama3.1",
            _ => "disabled",
        }
        .to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// How context is selected for each question.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Forward the entire document on every question.
    #[default]
    FullDocument,
    /// Embed paragraph chunks and forward the nearest ones.
    Chunked,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub strategy: RetrievalStrategy,
    #[serde(default = "default_context_chunks")]
    pub context_chunks: usize,
    /// Chunk size for the chunked strategy.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::default(),
            context_chunks: default_context_chunks(),
            max_tokens: default_max_tokens(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_context_chunks() -> usize {
    3
}
fn default_max_tokens() -> usize {
    200
}
fn default_preview_chars() -> usize {
    500
}

impl Config {
    /// Configuration used when no config file exists: every section at its
    /// default, with `RESUME_PATH` applied.
    pub fn minimal() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(RESUME_PATH_ENV) {
            if !path.trim().is_empty() {
                self.document.path = Some(PathBuf::from(path));
            }
        }
    }

    /// Path of the single upload slot.
    pub fn upload_path(&self) -> PathBuf {
        self.upload.dir.join(&self.upload.file_name)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;
    config.apply_env();
    Ok(config)
}

/// Parse and validate a TOML configuration string. Does not consult the
/// environment.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.upload.file_name.trim().is_empty() {
        anyhow::bail!("upload.file_name must not be empty");
    }
    if !config.upload.file_name.to_lowercase().ends_with(".pdf") {
        anyhow::bail!("upload.file_name must end in .pdf");
    }
    if config.upload.max_bytes == 0 {
        anyhow::bail!("upload.max_bytes must be > 0");
    }

    // Validate answerer
    match config.answerer.provider.as_str() {
        "gemini" | "openai" | "ollama" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown answerer provider: '{}'. Must be gemini, openai, ollama, or disabled.",
            other
        ),
    }
    if config.answerer.timeout_secs == 0 {
        anyhow::bail!("answerer.timeout_secs must be > 0");
    }

    // Validate retrieval
    if config.retrieval.max_tokens == 0 {
        anyhow::bail!("retrieval.max_tokens must be > 0");
    }
    if config.retrieval.context_chunks == 0 {
        anyhow::bail!("retrieval.context_chunks must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }
    if config.retrieval.strategy == RetrievalStrategy::Chunked && !config.embedding.is_enabled() {
        anyhow::bail!("retrieval.strategy = \"chunked\" requires an embedding provider");
    }

    Ok(())
}
