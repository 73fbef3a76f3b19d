use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sep;

/// The `UNKNOWN` entity type, used for placeholder entities (spec.md §3
/// invariant 1) and for observations whose type falls outside the
/// configured finite set (spec.md §4.2 step 5).
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// An entity node in the knowledge graph.
///
/// Attributes per spec.md §3: canonical name (uppercased, primary key),
/// type (uppercased, drawn from a configured set ∪ {`UNKNOWN`}),
/// `<SEP>`-joined descriptions, `<SEP>`-joined source IDs, creation
/// timestamp. Created on first observation, mutated on every subsequent
/// one, never deleted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntity {
    pub name: String,
    pub entity_type: String,
    pub descriptions: String,
    pub source_ids: String,
    pub created_at: DateTime<Utc>,
}

impl GraphEntity {
    #[must_use]
    pub fn placeholder(name: &str, source_id: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            entity_type: UNKNOWN_TYPE.to_string(),
            descriptions: String::new(),
            source_ids: source_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn description_list(&self) -> Vec<String> {
        sep::split(&self.descriptions)
    }

    #[must_use]
    pub fn source_id_list(&self) -> Vec<String> {
        sep::split(&self.source_ids)
    }
}

/// A single LM-extracted entity observation within one chunk, prior to
/// merge with any existing graph state. Mirrors spec.md §4.2's accumulated
/// entity list entries after dedup/normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityObservation {
    pub name: String,
    pub entity_type: String,
    pub description: String,
    pub source_id: String,
}
