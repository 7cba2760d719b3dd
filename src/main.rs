//! # Resume Chat CLI (`resume-chat`)
//!
//! Serves the resume chatbot over HTTP and offers one-shot commands for
//! asking questions and inspecting PDF extraction from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! resume-chat --config ./config/resume-chat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `resume-chat serve` | Start the HTTP API |
//! | `resume-chat ask "<question>"` | Load a resume and answer one question |
//! | `resume-chat extract <pdf>` | Print the normalized text of a PDF |
//! | `resume-chat status` | Show the effective configuration |
//!
//! ## Examples
//!
//! ```bash
//! # Serve with the resume from the environment
//! RESUME_PATH=./resume.pdf resume-chat serve
//!
//! # One-off question
//! resume-chat ask "What are your main technical skills?" --document ./resume.pdf
//!
//! # See what the model will see
//! resume-chat extract ./resume.pdf
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use resume_chat::config::{self, Config};
use resume_chat::loader::{Loader, PdfLoader};
use resume_chat::server;
use resume_chat::session::Session;

/// Resume Chat: ask questions about a resume, answered in the first person
/// by a generative model.
#[derive(Parser)]
#[command(name = "resume-chat", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/resume-chat.toml`. When the file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/resume-chat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    ///
    /// Binds to `[server].bind` (default `127.0.0.1:8000`).
    Serve,

    /// Load a resume and answer a single question.
    Ask {
        /// The question to ask.
        question: String,

        /// PDF to answer from. Defaults to `[document].path` or `RESUME_PATH`.
        #[arg(long)]
        document: Option<PathBuf>,

        /// Number of context chunks to retrieve (chunked strategy only).
        #[arg(long)]
        chunks: Option<usize>,
    },

    /// Print the extracted, normalized text of a PDF.
    Extract {
        /// Path to the PDF file.
        path: PathBuf,
    },

    /// Show the effective configuration.
    Status,
}

fn load(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(config = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let cfg = load(&cli.config)?;
            server::run_server(&cfg).await?;
        }
        Commands::Ask {
            question,
            document,
            chunks,
        } => {
            let cfg = load(&cli.config)?;
            let Some(path) = document.or_else(|| cfg.document.path.clone()) else {
                bail!(
                    "No resume given: pass --document or set {}",
                    config::RESUME_PATH_ENV
                );
            };
            let session = Session::from_config(&cfg)?;
            let outcome = session.install(path).await;
            if !outcome.is_success() {
                bail!("Failed to load resume: {}", outcome.message);
            }
            let answer = session.query(&question, chunks).await?;
            if let Some(err) = answer.error {
                bail!("{}", err);
            }
            println!("{}", answer.answer);
        }
        Commands::Extract { path } => {
            let text = PdfLoader
                .load(&path)
                .with_context(|| format!("Failed to extract {}", path.display()))?;
            println!("{}", text);
            eprintln!("{} characters", text.chars().count());
        }
        Commands::Status => {
            let cfg = load(&cli.config)?;
            print_status(&cfg);
        }
    }

    Ok(())
}

fn print_status(cfg: &Config) {
    match &cfg.document.path {
        Some(path) => println!(
            "document:   {} ({})",
            path.display(),
            if path.exists() { "present" } else { "missing" }
        ),
        None => println!("document:   (none)"),
    }
    println!("upload:     {}", cfg.upload_path().display());
    println!(
        "answerer:   {} / {} (timeout {}s)",
        cfg.answerer.provider,
        cfg.answerer.model_or_default(),
        cfg.answerer.timeout_secs
    );
    println!("retrieval:  {:?}", cfg.retrieval.strategy);
    if cfg.embedding.is_enabled() {
        println!(
            "embedding:  {} / {}",
            cfg.embedding.provider,
            cfg.embedding.model.as_deref().unwrap_or("-")
        );
    }
    println!("bind:       {}", cfg.server.bind);
}
