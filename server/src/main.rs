//! Sahay support chatbot CLI.
//!
//! `serve` starts the HTTP API with the embedded chat page; `ingest` loads
//! catalog documents into the knowledge base.

mod http;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sahay_rag::processing::TextChunker;
use sahay_rag::{Ingestor, LanceStore, SupportConfig};

#[derive(Parser)]
#[command(name = "sahay")]
#[command(author, version, about = "Customer support chatbot over a product knowledge base", long_about = None)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API and chat page
    Serve {
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: String,
    },

    /// Ingest text documents into the knowledge base
    Ingest {
        /// Files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SupportConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => SupportConfig::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Serve { bind } => http::serve(config, &bind).await,
        Commands::Ingest { files } => ingest(config, &files).await,
    }
}

async fn ingest(config: SupportConfig, files: &[PathBuf]) -> anyhow::Result<()> {
    let embeddings = sahay_rag::embeddings::from_config(&config.embedding)?;
    let index = Arc::new(LanceStore::new(&config.index_dir(), config.embedding.dimension).await?);
    let chunker = TextChunker::new(
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.chunking.min_chunk_size,
    );
    let ingestor = Ingestor::new(chunker, embeddings, index as _);

    let mut total = 0;
    for file in files {
        total += ingestor
            .ingest_file(file)
            .await
            .with_context(|| format!("Ingestion failed for {}", file.display()))?;
    }
    tracing::info!(files = files.len(), chunks = total, "Ingestion complete");

    Ok(())
}
