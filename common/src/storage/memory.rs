//! In-memory reference implementations of the three storage traits, used by
//! tests and by `integration-tests`. Plays the role the template's
//! `SurrealDbClient::memory()` plays for its test suite: a real, fully
//! functional backend with no external process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::model::{GraphEntity, GraphRelationship, Source};
use crate::storage::graph::{relationship_map_key, GraphStore};
use crate::storage::kv::KvStore;
use crate::storage::vector::VectorStore;

#[derive(Debug, Default)]
struct MemoryKvInner {
    sources: HashMap<String, Source>,
}

/// In-memory KV store.
#[derive(Debug, Default, Clone)]
pub struct MemoryKvStore {
    inner: Arc<RwLock<MemoryKvInner>>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn kv_source(&self, id: &str) -> Result<Source, AppError> {
        self.inner
            .read()
            .await
            .sources
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::SourceNotFound(id.to_string()))
    }

    async fn kv_upsert_sources(&self, sources: &[Source]) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        for source in sources {
            inner.sources.insert(source.id.clone(), source.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryGraphInner {
    entities: HashMap<String, GraphEntity>,
    relationships: HashMap<(String, String), GraphRelationship>,
}

/// In-memory graph store. Degree is computed on demand by scanning
/// relationships incident to a name in either direction (spec.md §4.6
/// treats adjacency as symmetric).
#[derive(Debug, Default, Clone)]
pub struct MemoryGraphStore {
    inner: Arc<RwLock<MemoryGraphInner>>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn graph_entity(&self, name: &str) -> Result<GraphEntity, AppError> {
        self.inner
            .read()
            .await
            .entities
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::EntityNotFound(name.to_string()))
    }

    async fn graph_relationship(
        &self,
        source: &str,
        target: &str,
    ) -> Result<GraphRelationship, AppError> {
        self.inner
            .read()
            .await
            .relationships
            .get(&(source.to_string(), target.to_string()))
            .cloned()
            .ok_or_else(|| AppError::RelationshipNotFound(source.to_string(), target.to_string()))
    }

    async fn graph_upsert_entity(&self, entity: GraphEntity) -> Result<(), AppError> {
        self.inner.write().await.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    async fn graph_upsert_relationship(
        &self,
        relationship: GraphRelationship,
    ) -> Result<(), AppError> {
        let key = (relationship.source.clone(), relationship.target.clone());
        self.inner.write().await.relationships.insert(key, relationship);
        Ok(())
    }

    async fn graph_entities(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, GraphEntity>, AppError> {
        let inner = self.inner.read().await;
        Ok(names
            .iter()
            .filter_map(|name| inner.entities.get(name).map(|e| (name.clone(), e.clone())))
            .collect())
    }

    async fn graph_relationships(
        &self,
        pairs: &[(String, String)],
    ) -> Result<HashMap<String, GraphRelationship>, AppError> {
        let inner = self.inner.read().await;
        Ok(pairs
            .iter()
            .filter_map(|(s, t)| {
                inner
                    .relationships
                    .get(&(s.clone(), t.clone()))
                    .map(|r| (relationship_map_key(s, t), r.clone()))
            })
            .collect())
    }

    async fn graph_count_entities_relationships(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, u64>, AppError> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<String, u64> = names.iter().map(|n| (n.clone(), 0)).collect();
        for (source, target) in inner.relationships.keys() {
            if let Some(c) = counts.get_mut(source) {
                *c += 1;
            }
            if source != target {
                if let Some(c) = counts.get_mut(target) {
                    *c += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn graph_related_entities(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let inner = self.inner.read().await;
        let mut out: HashMap<String, Vec<String>> = names.iter().map(|n| (n.clone(), Vec::new())).collect();
        for (source, target) in inner.relationships.keys() {
            if let Some(neighbors) = out.get_mut(source) {
                if !neighbors.contains(target) {
                    neighbors.push(target.clone());
                }
            }
            if source != target {
                if let Some(neighbors) = out.get_mut(target) {
                    if !neighbors.contains(source) {
                        neighbors.push(source.clone());
                    }
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
struct MemoryVectorInner {
    entities: HashMap<String, String>,
    relationships: HashMap<(String, String), String>,
}

/// In-memory vector store. Search is a trivial substring-containment scan
/// over payloads rather than real embeddings — adequate for tests, never
/// advertised as production-grade semantic search.
#[derive(Debug, Default, Clone)]
pub struct MemoryVectorStore {
    inner: Arc<RwLock<MemoryVectorInner>>,
}

impl MemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(payload: &str, query: &str) -> bool {
        let payload_lower = payload.to_lowercase();
        query
            .to_lowercase()
            .split_whitespace()
            .any(|term| !term.is_empty() && payload_lower.contains(term))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn vector_query_entity(&self, text: &str, top_k: usize) -> Result<Vec<String>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entities
            .iter()
            .filter(|(_, payload)| Self::matches(payload, text))
            .map(|(name, _)| name.clone())
            .take(top_k)
            .collect())
    }

    async fn vector_query_relationship(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<(String, String)>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .relationships
            .iter()
            .filter(|(_, payload)| Self::matches(payload, text))
            .map(|(key, _)| key.clone())
            .take(top_k)
            .collect())
    }

    async fn vector_upsert_entity(&self, name: &str, payload: &str) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .entities
            .insert(name.to_string(), payload.to_string());
        Ok(())
    }

    async fn vector_upsert_relationship(
        &self,
        source: &str,
        target: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .relationships
            .insert((source.to_string(), target.to_string()), payload.to_string());
        Ok(())
    }
}
