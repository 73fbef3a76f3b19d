use chrono::{DateTime, Utc};

use common::model::{EntityObservation, GraphEntity};
use common::sep;

use super::mode::mode_first_occurrence;

/// The merged-but-not-yet-summarized shape of an entity, per spec.md §4.3
/// steps 1-4. Descriptions are left as a deduplicated list so the caller
/// can decide whether to summarize (step 5) before building the final
/// [`GraphEntity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDraft {
    pub name: String,
    pub entity_type: String,
    pub descriptions: Vec<String>,
    pub source_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Builds an [`EntityDraft`] from the existing graph entity (if any) and
/// the new observations for this name, implementing spec.md §4.3 steps
/// 1-4 (load-or-seed, append type/description, add source ID, compute
/// merged type as the mode).
///
/// # Panics
/// Panics if `observations` is empty; callers only invoke this per
/// non-empty observation group produced by the extraction driver.
#[must_use]
pub fn build_entity_draft(
    existing: Option<&GraphEntity>,
    observations: &[EntityObservation],
    chunk_id: &str,
) -> EntityDraft {
    assert!(!observations.is_empty(), "observation group must be non-empty");

    let name = observations[0].name.clone();
    let mut existing_types: Vec<String> = Vec::new();
    let mut existing_descs: Vec<String>;
    let mut existing_source_ids: Vec<String>;
    let created_at;

    if let Some(entity) = existing {
        existing_types.push(entity.entity_type.clone());
        existing_descs = entity.description_list();
        existing_source_ids = entity.source_id_list();
        created_at = entity.created_at;
    } else {
        existing_descs = Vec::new();
        existing_source_ids = Vec::new();
        created_at = Utc::now();
    }

    for observation in observations {
        existing_types.push(observation.entity_type.clone());
        sep::push_unique(&mut existing_descs, observation.description.clone());
    }
    sep::push_unique(&mut existing_source_ids, chunk_id.to_string());

    EntityDraft {
        name,
        entity_type: mode_first_occurrence(&existing_types),
        descriptions: existing_descs,
        source_ids: existing_source_ids,
        created_at,
    }
}
