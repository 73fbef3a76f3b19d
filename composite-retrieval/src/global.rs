use std::collections::HashMap;

use common::error::AppError;
use common::model::{ContextBucket, EntityContext, RelationshipContext, SourceContext};
use common::storage::graph::relationship_map_key;
use common::storage::{GraphStore, KvStore, VectorStore};

/// Global (relationship-first) retrieval path, spec.md §4.6.
pub async fn global_retrieve(
    high_keywords: &str,
    graph: &dyn GraphStore,
    vector: &dyn VectorStore,
    kv: &dyn KvStore,
    top_k: usize,
) -> Result<ContextBucket, AppError> {
    let candidates = vector.vector_query_relationship(high_keywords, top_k).await?;
    if candidates.is_empty() {
        return Ok(ContextBucket::default());
    }

    let relationship_map = graph.graph_relationships(&candidates).await?;

    let mut endpoint_names: Vec<String> = Vec::new();
    for (source, target) in &candidates {
        if !endpoint_names.contains(source) {
            endpoint_names.push(source.clone());
        }
        if !endpoint_names.contains(target) {
            endpoint_names.push(target.clone());
        }
    }
    let degrees = graph.graph_count_entities_relationships(&endpoint_names).await?;

    let mut relationships = Vec::new();
    for (source, target) in &candidates {
        let key = relationship_map_key(source, target);
        if let Some(relationship) = relationship_map.get(&key) {
            let ref_count =
                degrees.get(source).copied().unwrap_or(0) + degrees.get(target).copied().unwrap_or(0);
            relationships.push(RelationshipContext {
                source: relationship.source.clone(),
                target: relationship.target.clone(),
                keywords: relationship.keywords.clone(),
                description: relationship.descriptions.clone(),
                weight: relationship.weight,
                ref_count,
                created_at: relationship.created_at,
            });
        }
    }

    let endpoint_entities = graph.graph_entities(&endpoint_names).await?;
    let entities: Vec<EntityContext> = endpoint_names
        .iter()
        .filter_map(|name| endpoint_entities.get(name))
        .map(|entity| EntityContext {
            name: entity.name.clone(),
            entity_type: entity.entity_type.clone(),
            description: entity.descriptions.clone(),
            ref_count: degrees.get(&entity.name).copied().unwrap_or(0),
            created_at: entity.created_at,
        })
        .collect();

    let mut source_counts: HashMap<String, u64> = HashMap::new();
    for (source, target) in &candidates {
        let key = relationship_map_key(source, target);
        if let Some(relationship) = relationship_map.get(&key) {
            for source_id in relationship.source_id_list() {
                *source_counts.entry(source_id).or_insert(0) += 1;
            }
        }
    }
    let mut sources = Vec::new();
    for (id, ref_count) in &source_counts {
        if let Ok(source) = kv.kv_source(id).await {
            sources.push(SourceContext {
                content: source.content,
                ref_count: *ref_count,
            });
        }
    }

    Ok(ContextBucket {
        entities,
        relationships,
        sources,
    })
}
