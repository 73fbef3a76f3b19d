use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sep;

/// An edge in the knowledge graph.
///
/// Attributes per spec.md §3: source/target entity names (uppercased),
/// weight (non-negative, additive across observations), `<SEP>`-joined
/// descriptions, deduplicated keyword list, `<SEP>`-joined source IDs,
/// creation timestamp. Directionality is nominal; the retriever treats
/// relatedness as symmetric (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub descriptions: String,
    pub keywords: Vec<String>,
    pub source_ids: String,
    pub created_at: DateTime<Utc>,
}

impl GraphRelationship {
    #[must_use]
    pub fn key(source: &str, target: &str) -> (String, String) {
        (source.to_uppercase(), target.to_uppercase())
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

/// A single LM-extracted relationship observation within one chunk, prior
/// to merge. Mirrors spec.md §4.2's accumulated relationship list entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipObservation {
    pub source: String,
    pub target: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub weight: f64,
    pub source_id: String,
}
