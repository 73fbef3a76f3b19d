pub mod driver;
pub mod parsing;

use std::collections::HashMap;

use common::model::graph_entity::UNKNOWN_TYPE;
use common::model::{EntityObservation, RelationshipObservation};

use parsing::{RawEntity, RawRelationship};

pub use driver::ExtractionDriver;

/// The two maps C2 hands off to the merger (spec.md §4.2 Output):
/// observations grouped by entity name and by relationship `(source,
/// target)` key.
#[derive(Debug, Clone, Default)]
pub struct ChunkExtraction {
    pub chunk_id: String,
    pub entities_by_name: HashMap<String, Vec<EntityObservation>>,
    pub relationships_by_key: HashMap<(String, String), Vec<RelationshipObservation>>,
}

/// C2 step 5: dedup & normalization of the accumulated raw LM output.
/// Uppercases names/types, rewrites unconfigured types to `UNKNOWN`,
/// groups entities by name and relationships by `(source, target)`.
#[must_use]
pub fn dedup_normalize(
    chunk_id: &str,
    entities: Vec<RawEntity>,
    relationships: Vec<RawRelationship>,
    allowed_types: &[String],
) -> ChunkExtraction {
    let allowed_upper: Vec<String> = allowed_types.iter().map(|t| t.to_uppercase()).collect();

    let mut entities_by_name: HashMap<String, Vec<EntityObservation>> = HashMap::new();
    for raw in entities {
        let name = raw.entity_name.to_uppercase();
        let mut entity_type = raw.entity_type.to_uppercase();
        if !allowed_upper.contains(&entity_type) {
            entity_type = UNKNOWN_TYPE.to_string();
        }
        entities_by_name
            .entry(name.clone())
            .or_default()
            .push(EntityObservation {
                name,
                entity_type,
                description: raw.entity_description,
                source_id: chunk_id.to_string(),
            });
    }

    let mut relationships_by_key: HashMap<(String, String), Vec<RelationshipObservation>> =
        HashMap::new();
    for raw in relationships {
        let source = raw.source_entity.to_uppercase();
        let target = raw.target_entity.to_uppercase();
        relationships_by_key
            .entry((source.clone(), target.clone()))
            .or_default()
            .push(RelationshipObservation {
                source,
                target,
                description: raw.relationship_description,
                keywords: raw.relationship_keywords,
                weight: raw.relationship_strength,
                source_id: chunk_id.to_string(),
            });
    }

    ChunkExtraction {
        chunk_id: chunk_id.to_string(),
        entities_by_name,
        relationships_by_key,
    }
}
