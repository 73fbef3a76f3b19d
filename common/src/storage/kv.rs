use async_trait::async_trait;

use crate::error::AppError;
use crate::model::Source;

/// The key-value store collaborator (spec.md §6 "Storage interface").
///
/// `kvSource` not-found is a distinguishable error (`AppError::SourceNotFound`);
/// `kvUpsertSources` persists a whole chunk batch from C1 before extraction
/// begins.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn kv_source(&self, id: &str) -> Result<Source, AppError>;
    async fn kv_upsert_sources(&self, sources: &[Source]) -> Result<(), AppError>;
}
