use chrono::{DateTime, Utc};

use common::model::{GraphRelationship, RelationshipObservation};
use common::sep;

/// The merged-but-not-yet-summarized shape of a relationship, per spec.md
/// §4.3 steps 1-4. Keywords are deduplicated element-wise (not `<SEP>`-split,
/// since they are stored as a real list, unlike descriptions/sourceIDs).
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDraft {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub descriptions: Vec<String>,
    pub keywords: Vec<String>,
    pub source_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Builds a [`RelationshipDraft`] from the existing relationship (if any)
/// and the new observations for this `(source, target)` key, implementing
/// spec.md §4.3 steps 1-3 (additive weight, deduped descriptions/keywords,
/// source ID tracking).
///
/// # Panics
/// Panics if `observations` is empty.
#[must_use]
pub fn build_relationship_draft(
    existing: Option<&GraphRelationship>,
    observations: &[RelationshipObservation],
    chunk_id: &str,
) -> RelationshipDraft {
    assert!(!observations.is_empty(), "observation group must be non-empty");

    let source = observations[0].source.clone();
    let target = observations[0].target.clone();

    let mut weight: f64;
    let mut descriptions: Vec<String>;
    let mut keywords: Vec<String>;
    let mut source_ids: Vec<String>;
    let created_at;

    if let Some(relationship) = existing {
        weight = relationship.weight;
        descriptions = relationship.description_list();
        keywords = relationship.keywords.clone();
        source_ids = relationship.source_id_list();
        created_at = relationship.created_at;
    } else {
        weight = 0.0;
        descriptions = Vec::new();
        keywords = Vec::new();
        source_ids = Vec::new();
        created_at = Utc::now();
    }

    for observation in observations {
        weight += observation.weight;
        sep::push_unique(&mut descriptions, observation.description.clone());
        for keyword in &observation.keywords {
            sep::push_unique(&mut keywords, keyword.clone());
        }
    }
    sep::push_unique(&mut source_ids, chunk_id.to_string());

    RelationshipDraft {
        source,
        target,
        weight,
        descriptions,
        keywords,
        source_ids,
        created_at,
    }
}
