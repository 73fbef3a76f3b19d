use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AppError;
use crate::model::{GraphEntity, GraphRelationship};

/// The graph store collaborator (spec.md §6). `graph_entity`/
/// `graph_relationship` surface `AppError::EntityNotFound`/
/// `RelationshipNotFound` as expected control flow, not failures (spec.md
/// §7).
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn graph_entity(&self, name: &str) -> Result<GraphEntity, AppError>;

    async fn graph_relationship(
        &self,
        source: &str,
        target: &str,
    ) -> Result<GraphRelationship, AppError>;

    async fn graph_upsert_entity(&self, entity: GraphEntity) -> Result<(), AppError>;

    async fn graph_upsert_relationship(
        &self,
        relationship: GraphRelationship,
    ) -> Result<(), AppError>;

    async fn graph_entities(&self, names: &[String]) -> Result<HashMap<String, GraphEntity>, AppError>;

    /// Keyed by `"source-target"` per spec.md §6, built via
    /// [`crate::sep`]-independent composite key formatting (see
    /// `relationship_map_key`).
    async fn graph_relationships(
        &self,
        pairs: &[(String, String)],
    ) -> Result<HashMap<String, GraphRelationship>, AppError>;

    /// Degree (count of incident relationships) per entity name.
    async fn graph_count_entities_relationships(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, u64>, AppError>;

    /// Neighbor entity names reachable from each seed name, treating
    /// relatedness as symmetric (spec.md §4.6).
    async fn graph_related_entities(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError>;
}

/// Builds the `"source-target"` composite map key used by
/// [`GraphStore::graph_relationships`]'s return value (spec.md §6). Note
/// this is purely a *presentation* key for that one map; the store itself
/// is queried with a real `(String, String)` tuple so a `-` inside a name
/// can never cause ambiguity in storage or merge logic (see SPEC_FULL.md
/// Open Question resolutions).
#[must_use]
pub fn relationship_map_key(source: &str, target: &str) -> String {
    format!("{source}-{target}")
}
