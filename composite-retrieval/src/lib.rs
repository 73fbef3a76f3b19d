//! C6 of the hybrid RAG core: runs the local (entity-first) and global
//! (relationship-first) retrieval paths concurrently and merges them into a
//! ranked [`QueryResult`].

pub mod csv;
pub mod global;
pub mod local;
pub mod rank;

use std::sync::Arc;

use common::error::AppError;
use common::model::QueryResult;
use common::storage::{GraphStore, KvStore, VectorStore};

pub use csv::serialize_query_result;

/// Runs both retrieval paths for a query and returns the raw (unmerged)
/// `{local, global}` buckets. Callers that need the stable wire format
/// should pass the result to [`serialize_query_result`].
pub struct Retriever {
    graph: Arc<dyn GraphStore>,
    vector: Arc<dyn VectorStore>,
    kv: Arc<dyn KvStore>,
    top_k: usize,
}

impl Retriever {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphStore>,
        vector: Arc<dyn VectorStore>,
        kv: Arc<dyn KvStore>,
        top_k: usize,
    ) -> Self {
        Self {
            graph,
            vector,
            kv,
            top_k,
        }
    }

    /// spec.md §4.6 "Concurrency": local and global run in parallel; if
    /// either fails, the whole query fails.
    #[tracing::instrument(skip(self))]
    pub async fn answer_query(
        &self,
        low_keywords: &str,
        high_keywords: &str,
    ) -> Result<QueryResult, AppError> {
        let (local, global) = tokio::try_join!(
            local::local_retrieve(
                low_keywords,
                self.graph.as_ref(),
                self.vector.as_ref(),
                self.kv.as_ref(),
                self.top_k,
            ),
            global::global_retrieve(
                high_keywords,
                self.graph.as_ref(),
                self.vector.as_ref(),
                self.kv.as_ref(),
                self.top_k,
            ),
        )?;
        Ok(QueryResult { local, global })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::model::{GraphEntity, GraphRelationship};
    use common::storage::{MemoryGraphStore, MemoryKvStore, MemoryVectorStore};

    use super::*;

    async fn seeded_stores() -> (Arc<MemoryGraphStore>, Arc<MemoryVectorStore>, Arc<MemoryKvStore>) {
        let graph = Arc::new(MemoryGraphStore::new());
        let vector = Arc::new(MemoryVectorStore::new());
        let kv = Arc::new(MemoryKvStore::new());
        let now = Utc::now();

        kv.kv_upsert_sources(&[common::model::Source::new(
            "d1",
            0,
            "Alice met Bob in Paris.".into(),
            6,
        )])
        .await
        .unwrap();

        graph
            .graph_upsert_entity(GraphEntity {
                name: "ALICE".into(),
                entity_type: "PERSON".into(),
                descriptions: "a woman".into(),
                source_ids: "d1-chunk-0".into(),
                created_at: now,
            })
            .await
            .unwrap();
        graph
            .graph_upsert_entity(GraphEntity {
                name: "BOB".into(),
                entity_type: "PERSON".into(),
                descriptions: "a man".into(),
                source_ids: "d1-chunk-0".into(),
                created_at: now,
            })
            .await
            .unwrap();
        graph
            .graph_upsert_relationship(GraphRelationship {
                source: "ALICE".into(),
                target: "BOB".into(),
                weight: 3.0,
                descriptions: "met".into(),
                keywords: vec!["meeting".into()],
                source_ids: "d1-chunk-0".into(),
                created_at: now,
            })
            .await
            .unwrap();

        vector.vector_upsert_entity("ALICE", "ALICEa woman").await.unwrap();
        vector
            .vector_upsert_relationship("ALICE", "BOB", "meetingALICEBOBmet")
            .await
            .unwrap();

        (graph, vector, kv)
    }

    #[tokio::test]
    async fn s5_local_retrieval() {
        let (graph, vector, kv) = seeded_stores().await;
        let retriever = Retriever::new(graph, vector, kv, 10);
        let result = retriever.answer_query("Alice", "nothing matches").await.unwrap();

        assert_eq!(result.local.entities.len(), 1);
        assert_eq!(result.local.entities[0].name, "ALICE");
        assert_eq!(result.local.entities[0].ref_count, 1);
        assert_eq!(result.local.relationships.len(), 1);
        assert_eq!(result.local.relationships[0].source, "ALICE");
        assert_eq!(result.local.relationships[0].target, "BOB");
        assert!(result.local.sources.iter().any(|s| s.ref_count > 0));
    }

    #[tokio::test]
    async fn s6_global_retrieval() {
        let (graph, vector, kv) = seeded_stores().await;
        let retriever = Retriever::new(graph, vector, kv, 10);
        let result = retriever.answer_query("nothing matches", "meeting").await.unwrap();

        assert_eq!(result.global.relationships.len(), 1);
        assert_eq!(result.global.relationships[0].ref_count, 2);
        assert_eq!(result.global.entities.len(), 2);
        assert_eq!(result.global.sources.len(), 1);
        assert_eq!(result.global.sources[0].ref_count, 1);
    }

    #[tokio::test]
    async fn empty_candidates_return_empty_buckets_without_error() {
        let (graph, vector, kv) = seeded_stores().await;
        let retriever = Retriever::new(graph, vector, kv, 10);
        let result = retriever
            .answer_query("nothing matches at all", "nothing matches either")
            .await
            .unwrap();
        assert!(result.local.entities.is_empty());
        assert!(result.global.relationships.is_empty());
    }
}
