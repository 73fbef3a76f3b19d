use async_trait::async_trait;

use crate::error::AppError;

/// The vector store collaborator (spec.md §6). The store computes its own
/// embeddings from `payload`; the core never maintains embeddings itself
/// (spec.md §4.4).
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn vector_query_entity(&self, text: &str, top_k: usize) -> Result<Vec<String>, AppError>;

    async fn vector_query_relationship(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<(String, String)>, AppError>;

    async fn vector_upsert_entity(&self, name: &str, payload: &str) -> Result<(), AppError>;

    async fn vector_upsert_relationship(
        &self,
        source: &str,
        target: &str,
        payload: &str,
    ) -> Result<(), AppError>;
}
