//! Closed error taxonomy for the document → answer pipeline.
//!
//! Validation failures ([`PipelineError::InvalidInput`],
//! [`PipelineError::NoDocumentLoaded`]) are rejected before a request
//! reaches the [`AnswerEngine`](crate::engine::AnswerEngine). Every other
//! variant is produced below the engine and converted into a structured
//! [`InitOutcome`](crate::engine::InitOutcome) or
//! [`Answer`](crate::engine::Answer) at the engine boundary.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured document path does not exist at load time.
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The PDF parsed but yielded no text on any page.
    #[error("No content extracted from PDF")]
    EmptyExtraction,

    /// The PDF container could not be parsed.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// Client-fault input: empty question, non-PDF upload, ...
    #[error("{0}")]
    InvalidInput(String),

    /// The embedding or generation capability returned an error.
    #[error("{0}")]
    Upstream(String),

    /// The embedding or generation capability did not answer in time.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// A query arrived before any document was provided.
    #[error("Please upload a resume first")]
    NoDocumentLoaded,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Wraps any upstream capability failure, keeping its full cause chain
    /// in the message.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        PipelineError::Upstream(format!("{:#}", err))
    }

    /// `true` for failures caused by the caller rather than the pipeline.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::NoDocumentLoaded
        )
    }
}
