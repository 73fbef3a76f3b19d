use std::collections::{HashMap, HashSet};

use common::error::AppError;
use common::model::{ContextBucket, EntityContext, RelationshipContext, SourceContext};
use common::storage::graph::relationship_map_key;
use common::storage::{GraphStore, KvStore, VectorStore};

/// Local (entity-first) retrieval path, spec.md §4.6.
pub async fn local_retrieve(
    low_keywords: &str,
    graph: &dyn GraphStore,
    vector: &dyn VectorStore,
    kv: &dyn KvStore,
    top_k: usize,
) -> Result<ContextBucket, AppError> {
    let candidates = vector.vector_query_entity(low_keywords, top_k).await?;
    if candidates.is_empty() {
        return Ok(ContextBucket::default());
    }

    let seed_entities = graph.graph_entities(&candidates).await?;
    let related = graph.graph_related_entities(&candidates).await?;

    let mut all_names: Vec<String> = candidates.clone();
    for neighbors in related.values() {
        for name in neighbors {
            if !all_names.contains(name) {
                all_names.push(name.clone());
            }
        }
    }
    let degrees = graph.graph_count_entities_relationships(&all_names).await?;

    let neighbor_names: Vec<String> = all_names
        .iter()
        .filter(|name| !candidates.contains(name))
        .cloned()
        .collect();
    let neighbor_entities = graph.graph_entities(&neighbor_names).await?;

    let entities: Vec<EntityContext> = candidates
        .iter()
        .filter_map(|name| seed_entities.get(name))
        .map(|entity| EntityContext {
            name: entity.name.clone(),
            entity_type: entity.entity_type.clone(),
            description: entity.descriptions.clone(),
            ref_count: degrees.get(&entity.name).copied().unwrap_or(0),
            created_at: entity.created_at,
        })
        .collect();

    let mut pair_set: HashSet<(String, String)> = HashSet::new();
    let mut pairs: Vec<(String, String)> = Vec::new();
    for seed in &candidates {
        if let Some(neighbors) = related.get(seed) {
            for neighbor in neighbors {
                let pair = (seed.clone(), neighbor.clone());
                if pair_set.insert(pair.clone()) {
                    pairs.push(pair);
                }
            }
        }
    }
    let relationship_map = graph.graph_relationships(&pairs).await?;
    let mut relationships = Vec::new();
    let mut seen_keys = HashSet::new();
    for (source, target) in &pairs {
        let key = relationship_map_key(source, target);
        if !seen_keys.insert(key.clone()) {
            continue;
        }
        if let Some(relationship) = relationship_map.get(&key) {
            let ref_count = degrees.get(&relationship.source).copied().unwrap_or(0)
                + degrees.get(&relationship.target).copied().unwrap_or(0);
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

    let mut source_counts: HashMap<String, u64> = HashMap::new();
    for name in &candidates {
        if let Some(entity) = seed_entities.get(name) {
            for source_id in entity.source_id_list() {
                source_counts.entry(source_id).or_insert(0);
            }
        }
    }
    for seed in &candidates {
        if let Some(neighbors) = related.get(seed) {
            for neighbor in neighbors {
                let neighbor_entity = seed_entities.get(neighbor).or_else(|| neighbor_entities.get(neighbor));
                if let Some(entity) = neighbor_entity {
                    for source_id in entity.source_id_list() {
                        if let Some(count) = source_counts.get_mut(&source_id) {
                            *count += 1;
                        }
                    }
                }
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
