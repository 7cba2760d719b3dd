//! PDF document loading.
//!
//! [`PdfLoader`] extracts text page by page with `pdf-extract`, skips pages
//! that produce no text (or only whitespace), joins the rest with newlines, trims the result and
//! runs it through [`clean_spaced_text`].
//!
//! A PDF whose pages all come out empty loads as `""`. That is not an
//! error at this layer; the [`AnswerEngine`](crate::engine::AnswerEngine)
//! classifies it as [`PipelineError::EmptyExtraction`].

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::normalize::clean_spaced_text;

/// Produces normalized document text from a path.
///
/// The engine only depends on this trait, so tests and alternative
/// formats can plug in their own source of text.
pub trait Loader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String>;
}

/// Production loader backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl Loader for PdfLoader {
    fn load(&self, path: &Path) -> Result<String> {
        load_pdf(path)
    }
}

/// Load a PDF from disk and return its normalized text.
///
/// # Errors
///
/// - [`PipelineError::NotFound`] if `path` does not exist.
/// - [`PipelineError::Io`] if the file cannot be read.
/// - [`PipelineError::Pdf`] if the container cannot be parsed.
pub fn load_pdf(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let pages = extract_pages(&bytes)?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "extracted PDF pages");
    Ok(join_pages(pages))
}

/// Extract the raw text of every page, in order.
///
/// `pdf-extract` panics on some malformed inputs; a panic is reported as
/// [`PipelineError::Pdf`] like any other parse failure.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(PipelineError::Pdf(e.to_string())),
        Err(_) => Err(PipelineError::Pdf(
            "PDF parser aborted on malformed input".to_string(),
        )),
    }
}

/// Concatenate non-empty pages with `\n`, trim, and normalize.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        // pdf-extract emits line breaks even for pages with no text.
        if page.trim().is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    clean_spaced_text(text.trim())
}
