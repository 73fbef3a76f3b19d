use common::error::AppError;
use common::model::Source;
use common::storage::KvStore;

use crate::handler::{normalize_content, DocumentHandler};

/// A document to be chunked and ingested (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub content: String,
}

/// C1 — Chunking Adapter (spec.md §4.1). Normalizes content, invokes the
/// handler to split it, assigns stable chunk IDs, and persists the
/// resulting sources before extraction begins. Chunking errors are fatal
/// and abort ingestion.
pub async fn chunk_document(
    document: &Document,
    handler: &dyn DocumentHandler,
    kv: &dyn KvStore,
) -> Result<Vec<Source>, AppError> {
    let normalized = normalize_content(&document.content);
    let chunk_texts = handler.chunk(&normalized)?;

    let sources: Vec<Source> = chunk_texts
        .into_iter()
        .enumerate()
        .map(|(order_index, text)| {
            let token_size = text.split_whitespace().count();
            Source::new(&document.id, order_index, text, token_size)
        })
        .collect();

    kv.kv_upsert_sources(&sources).await?;

    Ok(sources)
}
