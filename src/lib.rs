//! # Resume Chat
//!
//! A retrieval-augmented chatbot that answers questions about a single PDF
//! resume, speaking in the first person as the resume's subject.
//!
//! The loaded resume is small enough to hand to the model whole, so the
//! default strategy grounds every prompt in the full document text. An
//! optional chunked strategy embeds the resume into an in-memory context
//! store and forwards only the nearest chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌──────────┐
//! │   PDF    │──▶│  Loader   │──▶│ AnswerEngine │──▶│ Answerer │
//! │  upload  │   │ +normalize│   │ (+ store)    │   │ Gemini.. │
//! └──────────┘   └───────────┘   └──────┬───────┘   └──────────┘
//!                                       │
//!                                ┌──────┴──────┐
//!                                │   Session   │◀── HTTP / CLI
//!                                └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GOOGLE_API_KEY=...
//! resume-chat serve                          # HTTP API on 127.0.0.1:8000
//! resume-chat ask "What are your skills?" --document ./resume.pdf
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`normalize`] | Repair character-spaced lines from PDF extraction |
//! | [`loader`] | PDF text extraction |
//! | [`chunk`] | Text chunking for the chunked strategy |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Context store (vector similarity search) |
//! | [`answerer`] | Generative model abstraction |
//! | [`engine`] | Document state, prompt assembly, answering |
//! | [`session`] | Lifecycle of the single active engine |
//! | [`server`] | HTTP API |
//! | [`error`] | Pipeline error taxonomy |

pub mod answerer;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod server;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;
