use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk of a source document, the atomic unit of extraction.
///
/// Attributes per spec.md §3: stable ID (`<docID>-chunk-<orderIndex>`),
/// content, token size, zero-based order index. Created during chunking,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub content: String,
    pub token_size: usize,
    pub order_index: usize,
    pub created_at: DateTime<Utc>,
}

impl Source {
    #[must_use]
    pub fn new(doc_id: &str, order_index: usize, content: String, token_size: usize) -> Self {
        Self {
            id: format!("{doc_id}-chunk-{order_index}"),
            content,
            token_size,
            order_index,
            created_at: Utc::now(),
        }
    }
}
