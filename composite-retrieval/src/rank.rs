use common::model::{EntityContext, RelationshipContext, SourceContext};

/// Unions local and global entity contexts keyed by name (first occurrence
/// wins among duplicates), then sorts by `ref_count` descending. Stable
/// sort preserves the local-before-global tie-break (spec.md §4.6 "Merge
/// and rank").
#[must_use]
pub fn merge_entities(local: &[EntityContext], global: &[EntityContext]) -> Vec<EntityContext> {
    let mut merged: Vec<EntityContext> = Vec::new();
    for entity in local.iter().chain(global.iter()) {
        if !merged.iter().any(|e| e.name == entity.name) {
            merged.push(entity.clone());
        }
    }
    merged.sort_by(|a, b| b.ref_count.cmp(&a.ref_count));
    merged
}

/// Unions local and global relationship contexts keyed by `(source,
/// target)`.
#[must_use]
pub fn merge_relationships(
    local: &[RelationshipContext],
    global: &[RelationshipContext],
) -> Vec<RelationshipContext> {
    let mut merged: Vec<RelationshipContext> = Vec::new();
    for relationship in local.iter().chain(global.iter()) {
        if !merged
            .iter()
            .any(|r| r.source == relationship.source && r.target == relationship.target)
        {
            merged.push(relationship.clone());
        }
    }
    merged.sort_by(|a, b| b.ref_count.cmp(&a.ref_count));
    merged
}

/// Unions local and global source contexts keyed by their content (the only
/// stable textual representation a `SourceContext` carries).
#[must_use]
pub fn merge_sources(local: &[SourceContext], global: &[SourceContext]) -> Vec<SourceContext> {
    let mut merged: Vec<SourceContext> = Vec::new();
    for source in local.iter().chain(global.iter()) {
        if !merged.iter().any(|s| s.content == source.content) {
            merged.push(source.clone());
        }
    }
    merged.sort_by(|a, b| b.ref_count.cmp(&a.ref_count));
    merged
}
