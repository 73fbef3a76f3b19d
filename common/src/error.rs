use thiserror::Error;

/// Centralized error type for the ingestion and retrieval cores.
///
/// Mirrors spec.md §7: transient failures are retried by the caller before
/// ever surfacing here; the not-found variants are expected control-flow
/// signals at merge time, not failures.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("language model call failed: {0}")]
    Lm(String),

    #[error("failed to parse language model output as JSON: {0}")]
    LmParsing(String),

    #[error("extraction failed after {0} retries")]
    ExtractionExhausted(usize),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("relationship not found: {0}-{1}")]
    RelationshipNotFound(String, String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("key-value store error: {0}")]
    Kv(String),

    #[error("vector store error: {0}")]
    Vector(String),

    #[error("graph store error: {0}")]
    Graph(String),

    #[error("no user message present in conversation")]
    NoUserMessage,

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("openai error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors that represent a graph "not found" sentinel, i.e.
    /// expected control flow at merge time rather than a hard failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::EntityNotFound(_) | AppError::RelationshipNotFound(_, _)
        )
    }
}
