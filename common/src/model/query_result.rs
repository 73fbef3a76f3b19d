use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ranked entity surfaced by either retrieval path. `ref_count` is the
/// ranking score (spec.md §3, §4.6): graph degree for the local path, or
/// the degree of the endpoint entity on the global path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityContext {
    pub name: String,
    pub entity_type: String,
    pub description: String,
    pub ref_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A ranked relationship surfaced by either retrieval path. `ref_count` is
/// `degree(source) + degree(target)` on both paths (spec.md §4.6 steps 4/3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipContext {
    pub source: String,
    pub target: String,
    pub keywords: Vec<String>,
    pub description: String,
    pub weight: f64,
    pub ref_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A ranked source chunk surfaced by either retrieval path. `ref_count` is
/// a cross-reference count (spec.md §4.6 steps 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContext {
    pub content: String,
    pub ref_count: u64,
}

/// One retrieval path's three lazy-sequence buckets (spec.md §3). Local
/// and global paths each produce one of these; C6's merge-and-rank step
/// unions them into the final serialized result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBucket {
    pub entities: Vec<EntityContext>,
    pub relationships: Vec<RelationshipContext>,
    pub sources: Vec<SourceContext>,
}

/// The two parallel buckets produced by the dual-context retriever, before
/// merge-and-rank (spec.md §3, §4.6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub local: ContextBucket,
    pub global: ContextBucket,
}
