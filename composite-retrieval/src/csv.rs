use common::model::QueryResult;

use crate::rank::{merge_entities, merge_relationships, merge_sources};

/// Serializes a [`QueryResult`] into the stable wire format (spec.md §6
/// "Serialized QueryResult"): three fenced `csv` sections with stable
/// headers, local and global results merged and ranked.
#[must_use]
pub fn serialize_query_result(result: &QueryResult) -> String {
    let entities = merge_entities(&result.local.entities, &result.global.entities);
    let relationships = merge_relationships(&result.local.relationships, &result.global.relationships);
    let sources = merge_sources(&result.local.sources, &result.global.sources);

    let mut out = String::new();

    out.push_str("```csv\n");
    out.push_str("id,name,type,description,ref_count,created_at\n");
    for (id, entity) in entities.iter().enumerate() {
        out.push_str(&format!(
            "{id},{},{},{},{},{}\n",
            quote(&entity.name),
            quote(&entity.entity_type),
            quote(&entity.description),
            entity.ref_count,
            quote(&entity.created_at.to_rfc3339()),
        ));
    }
    out.push_str("```\n");

    out.push_str("```csv\n");
    out.push_str("id,source,target,keywords,description,weight,ref_count,created_at\n");
    for (id, relationship) in relationships.iter().enumerate() {
        out.push_str(&format!(
            "{id},{},{},{},{},{:.2},{},{}\n",
            quote(&relationship.source),
            quote(&relationship.target),
            quote(&relationship.keywords.join(", ")),
            quote(&relationship.description),
            relationship.weight,
            relationship.ref_count,
            quote(&relationship.created_at.to_rfc3339()),
        ));
    }
    out.push_str("```\n");

    out.push_str("```csv\n");
    out.push_str("id,content,ref_count\n");
    for (id, source) in sources.iter().enumerate() {
        out.push_str(&format!("{id},{},{}\n", quote(&source.content), source.ref_count));
    }
    out.push_str("```\n");

    out
}

/// Wraps a field in `"…"`, doubling embedded quotes (standard CSV escaping).
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
