pub mod entity_merge;
pub mod mode;
pub mod relationship_merge;

use std::sync::Arc;

use chrono::Utc;

use common::error::AppError;
use common::lm::LmClient;
use common::model::graph_entity::UNKNOWN_TYPE;
use common::model::{EntityObservation, GraphEntity, RelationshipObservation};
use common::sep;
use common::storage::{GraphStore, VectorStore};
use common::tokenizer::Tokenizer;

use crate::extraction::ChunkExtraction;
use crate::handler::DocumentHandler;

use entity_merge::build_entity_draft;
use relationship_merge::build_relationship_draft;

/// C3 — Merger (spec.md §4.3). Merges one chunk's extracted observations
/// into the graph and vector stores, summarizing overflowing descriptions
/// via the LM.
pub struct Merger {
    graph: Arc<dyn GraphStore>,
    vector: Arc<dyn VectorStore>,
    lm: Arc<dyn LmClient>,
    tokenizer: Arc<dyn Tokenizer>,
    handler: Arc<dyn DocumentHandler>,
}

impl Merger {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphStore>,
        vector: Arc<dyn VectorStore>,
        lm: Arc<dyn LmClient>,
        tokenizer: Arc<dyn Tokenizer>,
        handler: Arc<dyn DocumentHandler>,
    ) -> Self {
        Self {
            graph,
            vector,
            lm,
            tokenizer,
            handler,
        }
    }

    /// Merges every entity and relationship group extracted from one chunk.
    /// Groups within a chunk are merged sequentially; the driver is
    /// responsible for any cross-chunk concurrency (spec.md §4.3 "Ordering
    /// guarantees").
    #[tracing::instrument(skip(self, extraction), fields(chunk_id = %extraction.chunk_id))]
    pub async fn merge_chunk(&self, extraction: &ChunkExtraction) -> Result<(), AppError> {
        for observations in extraction.entities_by_name.values() {
            self.merge_entity(observations, &extraction.chunk_id).await?;
        }
        for observations in extraction.relationships_by_key.values() {
            self.merge_relationship(observations, &extraction.chunk_id).await?;
        }
        Ok(())
    }

    async fn merge_entity(
        &self,
        observations: &[EntityObservation],
        chunk_id: &str,
    ) -> Result<(), AppError> {
        let name = &observations[0].name;
        let existing = self.load_entity(name).await?;
        let draft = build_entity_draft(existing.as_ref(), observations, chunk_id);
        let merged_description = self.summarize(&draft.name, &draft.descriptions).await?;

        let entity = GraphEntity {
            name: draft.name.clone(),
            entity_type: draft.entity_type,
            descriptions: merged_description.clone(),
            source_ids: sep::join(&draft.source_ids),
            created_at: draft.created_at,
        };
        self.graph.graph_upsert_entity(entity).await?;

        let payload = format!("{}{}", draft.name, merged_description);
        self.vector.vector_upsert_entity(&draft.name, &payload).await?;
        Ok(())
    }

    async fn merge_relationship(
        &self,
        observations: &[RelationshipObservation],
        chunk_id: &str,
    ) -> Result<(), AppError> {
        let source = &observations[0].source;
        let target = &observations[0].target;
        let existing = self.load_relationship(source, target).await?;
        let draft = build_relationship_draft(existing.as_ref(), observations, chunk_id);
        let merged_description = self.summarize(source, &draft.descriptions).await?;

        self.ensure_endpoint(&draft.source, &merged_description, chunk_id).await?;
        self.ensure_endpoint(&draft.target, &merged_description, chunk_id).await?;

        let relationship = common::model::GraphRelationship {
            source: draft.source.clone(),
            target: draft.target.clone(),
            weight: draft.weight,
            descriptions: merged_description.clone(),
            keywords: draft.keywords.clone(),
            source_ids: sep::join(&draft.source_ids),
            created_at: draft.created_at,
        };
        self.graph.graph_upsert_relationship(relationship).await?;

        let payload = format!(
            "{}{}{}{}",
            sep::join(&draft.keywords),
            draft.source,
            draft.target,
            merged_description
        );
        self.vector
            .vector_upsert_relationship(&draft.source, &draft.target, &payload)
            .await?;
        Ok(())
    }

    /// spec.md §4.3 step 5 for relationships: creates a placeholder entity
    /// carrying the relationship's merged description if the endpoint
    /// doesn't already exist.
    async fn ensure_endpoint(
        &self,
        name: &str,
        merged_description: &str,
        chunk_id: &str,
    ) -> Result<(), AppError> {
        match self.graph.graph_entity(name).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                let placeholder = GraphEntity {
                    name: name.to_string(),
                    entity_type: UNKNOWN_TYPE.to_string(),
                    descriptions: merged_description.to_string(),
                    source_ids: chunk_id.to_string(),
                    created_at: Utc::now(),
                };
                self.graph.graph_upsert_entity(placeholder).await
            }
            Err(err) => Err(err),
        }
    }

    async fn load_entity(&self, name: &str) -> Result<Option<GraphEntity>, AppError> {
        match self.graph.graph_entity(name).await {
            Ok(entity) => Ok(Some(entity)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn load_relationship(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Option<common::model::GraphRelationship>, AppError> {
        match self.graph.graph_relationship(source, target).await {
            Ok(relationship) => Ok(Some(relationship)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// spec.md §4.3 step 5: verbatim join under the configured token
    /// threshold, else an LM summarization call.
    async fn summarize(&self, subject: &str, descriptions: &[String]) -> Result<String, AppError> {
        let joined = sep::join(descriptions);
        if self.tokenizer.count_tokens(&joined) < self.handler.max_summaries_token_length() {
            return Ok(joined);
        }

        let language = self.handler.entity_extraction_prompt_data().language;
        let prompt = format!(
            "Summarize the following descriptions of \"{subject}\" into a single concise \
             description, written in {language}: [{}]",
            descriptions.join(", ")
        );
        self.lm.chat(&[prompt]).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use common::lm::LmClient;
    use common::storage::{MemoryGraphStore, MemoryVectorStore};
    use common::tokenizer::ApproxTokenizer;

    use super::*;
    use crate::handler::TextSplitterHandler;

    struct UnreachableLm;

    #[async_trait]
    impl LmClient for UnreachableLm {
        async fn chat(&self, _messages: &[String]) -> Result<String, AppError> {
            panic!("LM should not be called when descriptions are short")
        }
    }

    fn handler(max_summaries_token_length: usize) -> Arc<dyn DocumentHandler> {
        Arc::new(TextSplitterHandler {
            goal: "extract".into(),
            entity_types: vec!["PERSON".into()],
            language: "English".into(),
            examples: vec![],
            min_tokens: 2,
            max_tokens: 50,
            overlap_tokens: 0,
            max_retries: 0,
            concurrency_count: 1,
            backoff: Duration::from_millis(1),
            glean_count: 0,
            max_summaries_token_length,
        })
    }

    fn merger(max_summaries_token_length: usize) -> Merger {
        Merger::new(
            Arc::new(MemoryGraphStore::new()),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(UnreachableLm),
            Arc::new(ApproxTokenizer),
            handler(max_summaries_token_length),
        )
    }

    fn extraction() -> ChunkExtraction {
        crate::extraction::dedup_normalize(
            "d1-chunk-0",
            vec![
                crate::extraction::parsing::RawEntity {
                    entity_name: "Alice".into(),
                    entity_type: "person".into(),
                    entity_description: "a woman".into(),
                },
                crate::extraction::parsing::RawEntity {
                    entity_name: "Bob".into(),
                    entity_type: "person".into(),
                    entity_description: "a man".into(),
                },
            ],
            vec![crate::extraction::parsing::RawRelationship {
                source_entity: "Alice".into(),
                target_entity: "Bob".into(),
                relationship_description: "met".into(),
                relationship_keywords: vec!["meeting".into()],
                relationship_strength: 3.0,
            }],
            &["PERSON".into()],
        )
    }

    #[tokio::test]
    async fn s1_single_chunk_two_entities_one_relationship() {
        let merger = merger(200);
        merger.merge_chunk(&extraction()).await.unwrap();

        let alice = merger.graph.graph_entity("ALICE").await.unwrap();
        assert_eq!(alice.entity_type, "PERSON");
        let bob = merger.graph.graph_entity("BOB").await.unwrap();
        assert_eq!(bob.entity_type, "PERSON");

        let rel = merger.graph.graph_relationship("ALICE", "BOB").await.unwrap();
        assert_eq!(rel.weight, 3.0);
        assert_eq!(rel.keywords, vec!["meeting".to_string()]);
        assert!(rel.source_ids.contains("d1-chunk-0"));
    }

    #[tokio::test]
    async fn s2_duplicate_ingestion_doubles_weight_keeps_descriptions() {
        let merger = merger(200);
        merger.merge_chunk(&extraction()).await.unwrap();
        merger.merge_chunk(&extraction()).await.unwrap();

        let rel = merger.graph.graph_relationship("ALICE", "BOB").await.unwrap();
        assert_eq!(rel.weight, 6.0);
        assert_eq!(rel.description_list(), vec!["met".to_string()]);
        assert_eq!(rel.source_id_list(), vec!["d1-chunk-0".to_string()]);

        let alice = merger.graph.graph_entity("ALICE").await.unwrap();
        assert_eq!(alice.description_list(), vec!["a woman".to_string()]);
    }

    #[tokio::test]
    async fn s3_missing_endpoint_gets_unknown_placeholder() {
        let merger = merger(200);
        let extraction = crate::extraction::dedup_normalize(
            "d1-chunk-0",
            vec![crate::extraction::parsing::RawEntity {
                entity_name: "Charlie".into(),
                entity_type: "person".into(),
                entity_description: "a man".into(),
            }],
            vec![crate::extraction::parsing::RawRelationship {
                source_entity: "Charlie".into(),
                target_entity: "Diana".into(),
                relationship_description: "knows".into(),
                relationship_keywords: vec![],
                relationship_strength: 1.0,
            }],
            &["PERSON".into()],
        );
        merger.merge_chunk(&extraction).await.unwrap();

        let charlie = merger.graph.graph_entity("CHARLIE").await.unwrap();
        assert_eq!(charlie.entity_type, "PERSON");
        let diana = merger.graph.graph_entity("DIANA").await.unwrap();
        assert_eq!(diana.entity_type, "UNKNOWN");
    }
}
