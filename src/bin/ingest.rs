//! Loads a corpus into the configured vector index.
//!
//! Input is either a JSONL file of `{"text": ..., "metadata": {...}}`
//! records or plain-text files that are chunked before upload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;

use lawloom_backend::core::config::{AppPaths, ConfigService, VectorStoreKind};
use lawloom_backend::core::logging;
use lawloom_backend::embeddings::build_embedder;
use lawloom_backend::rag::{Chunker, ChunkerConfig};
use lawloom_backend::vector::{Metadata, PineconeStore, VectorStoreClient};

#[derive(Debug, Parser)]
#[command(name = "ingest", about = "Embed documents and upsert them into the vector index")]
struct Args {
    /// JSONL file with one `{"text", "metadata"}` record per line
    #[arg(long, conflicts_with = "files")]
    jsonl: Option<PathBuf>,

    /// Plain-text files to chunk and upload
    #[arg(required_unless_present = "jsonl")]
    files: Vec<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    #[arg(long, default_value_t = 100)]
    chunk_overlap: usize,

    /// Chunk and report without embedding or uploading
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Deserialize)]
struct Record {
    text: String,
    #[serde(default)]
    metadata: Metadata,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "ingest.log");

    if args.chunk_overlap >= args.chunk_size {
        bail!(
            "--chunk-overlap ({}) must be smaller than --chunk-size ({})",
            args.chunk_overlap,
            args.chunk_size
        );
    }

    let (texts, metadata) = match &args.jsonl {
        Some(path) => read_jsonl(path)?,
        None => {
            let chunker = Chunker::new(ChunkerConfig {
                chunk_size: args.chunk_size,
                chunk_overlap: args.chunk_overlap,
            });
            chunk_files(&chunker, &args.files)?
        }
    };
    tracing::info!(chunks = texts.len(), "Prepared chunks");

    if args.dry_run || texts.is_empty() {
        return Ok(());
    }

    let settings = ConfigService::new(paths.clone())
        .load_ingest_settings()
        .context("Invalid configuration")?;
    if settings.vector_store.provider == VectorStoreKind::Memory {
        bail!("vector_store.provider is 'memory'; nothing would persist after ingestion");
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let embedder = build_embedder(&settings.embedding, client.clone())?;
    let store = PineconeStore::connect(client, &settings.vector_store, embedder.dimensions())
        .await
        .context("Failed to connect to Pinecone")?;
    let vector_client = VectorStoreClient::new(
        embedder,
        Arc::new(store),
        settings.vector_store.upsert_batch_size,
    );

    let started = Instant::now();
    let written = vector_client.upsert(&texts, &metadata).await?;
    tracing::info!(
        written,
        index = %settings.vector_store.index_name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Ingestion finished"
    );
    Ok(())
}

fn read_jsonl(path: &Path) -> anyhow::Result<(Vec<String>, Vec<Metadata>)> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut texts = Vec::new();
    let mut metadata = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), line_no + 1))?;
        if record.text.trim().is_empty() {
            tracing::warn!(line = line_no + 1, "Skipping record with empty text");
            continue;
        }
        texts.push(record.text);
        metadata.push(record.metadata);
    }
    Ok((texts, metadata))
}

fn chunk_files(chunker: &Chunker, files: &[PathBuf]) -> anyhow::Result<(Vec<String>, Vec<Metadata>)> {
    let mut texts = Vec::new();
    let mut metadata = Vec::new();
    for path in files {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let chunks = chunker.split(&contents, &source);
        tracing::debug!(source = %source, chunks = chunks.len(), "Chunked file");
        for chunk in chunks {
            metadata.push(chunk.metadata());
            texts.push(chunk.text);
        }
    }
    Ok((texts, metadata))
}
