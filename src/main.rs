//! # docqa CLI
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init` | Create the document store, index directory and index schema |
//! | `docqa serve` | Start the HTTP backend (needs `GROQ_API_KEY`) |
//! | `docqa chat` | Start the terminal client |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::config::{self, Secrets};
use docqa::index::VectorIndex;
use docqa::store::DocumentStore;

#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: ask questions about your PDF and text documents",
    version,
    long_about = "docqa stores uploaded PDF and text files, splits them into overlapping \
    chunks, embeds them into a local vector index, and answers questions with a hosted \
    language model over the most relevant chunks."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docqa.toml`. A missing file means built-in
    /// defaults.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the document store directory and the vector index.
    ///
    /// Idempotent: running it again leaves existing data alone.
    Init,

    /// Start the HTTP backend.
    ///
    /// Binds to `[server].bind`. Refuses to start when `GROQ_API_KEY` is
    /// not set.
    Serve,

    /// Start the interactive terminal client.
    Chat {
        /// Backend base URL. Overrides `[client].backend_url`.
        #[arg(long)]
        backend: Option<String>,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(match cli.command {
        Commands::Chat { .. } => "warn",
        _ => "info",
    });

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let documents = DocumentStore::new(&cfg.storage.document_dir);
            documents.ensure_dir().await.with_context(|| {
                format!(
                    "Failed to create document store: {}",
                    documents.dir().display()
                )
            })?;
            let index = VectorIndex::open(&cfg.storage.index_path()).await?;
            index.close().await;
            println!(
                "Initialized document store at {} and index at {}",
                cfg.storage.document_dir.display(),
                cfg.storage.index_path().display()
            );
        }
        Commands::Serve => {
            let secrets = Secrets::from_env()?;
            docqa::server::run_server(&cfg, &secrets).await?;
        }
        Commands::Chat { backend } => {
            let backend_url = backend.unwrap_or_else(|| cfg.client.backend_url.clone());
            docqa::chat::run_chat(&backend_url, &cfg.storage.users_file).await?;
        }
    }

    Ok(())
}
