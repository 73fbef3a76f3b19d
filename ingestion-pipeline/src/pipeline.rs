use std::sync::Arc;

use futures::future::join_all;
use state_machines::core::GuardError;
use tokio::sync::Semaphore;

use common::error::AppError;
use common::lm::LmClient;
use common::model::Source;
use common::storage::{GraphStore, KvStore, VectorStore};
use common::tokenizer::Tokenizer;

use crate::chunking::{chunk_document, Document};
use crate::extraction::ExtractionDriver;
use crate::handler::DocumentHandler;
use crate::merge::Merger;
use crate::state::{chunked, IngestionMachine, Merged};

/// Orchestrates C1 through C4 for one document (spec.md §2's ingestion data
/// flow). Chunking and the top-level stage sequencing are driven through
/// [`IngestionMachine`]; per-chunk extraction and merge run concurrently
/// under a handler-supplied bound, since spec.md §4.2's concurrency model
/// operates within the `Extracted` stage rather than across it.
pub struct IngestionPipeline {
    handler: Arc<dyn DocumentHandler>,
    kv: Arc<dyn KvStore>,
    extraction: Arc<ExtractionDriver>,
    merger: Arc<Merger>,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(
        handler: Arc<dyn DocumentHandler>,
        kv: Arc<dyn KvStore>,
        graph: Arc<dyn GraphStore>,
        vector: Arc<dyn VectorStore>,
        lm: Arc<dyn LmClient>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        let extraction = Arc::new(ExtractionDriver::new(lm.clone(), handler.clone()));
        let merger = Arc::new(Merger::new(graph, vector, lm, tokenizer, handler.clone()));
        Self {
            handler,
            kv,
            extraction,
            merger,
        }
    }

    /// Ingests one document end to end. Any chunk's failure aborts the
    /// whole ingestion (spec.md §4.2 "Scheduling model"); chunks that
    /// already finished merging keep their effects in storage.
    #[tracing::instrument(skip(self, document), fields(doc_id = %document.id))]
    pub async fn ingest_document(&self, document: &Document) -> Result<(), AppError> {
        let machine = chunked();

        let sources = match chunk_document(document, self.handler.as_ref(), self.kv.as_ref()).await
        {
            Ok(sources) => sources,
            Err(err) => {
                let _ = machine.abort();
                return Err(err);
            }
        };

        let machine = machine
            .extract()
            .map_err(|(_, guard)| map_guard_error("extract", &guard))?;

        match self.run_chunks(sources).await {
            Ok(()) => {}
            Err(err) => {
                let _ = machine.abort();
                return Err(err);
            }
        }

        let machine = machine
            .merge()
            .map_err(|(_, guard)| map_guard_error("merge", &guard))?;
        self.finish(machine)
    }

    /// Runs extraction and merge for every chunk concurrently, bounded by
    /// [`DocumentHandler::concurrency_count`] (spec.md §5 "Concurrency
    /// bound"). All spawned tasks run to completion regardless of earlier
    /// failures; the first error encountered is returned.
    async fn run_chunks(&self, sources: Vec<Source>) -> Result<(), AppError> {
        let permits = self.handler.concurrency_count().max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        let tasks = sources.into_iter().map(|source| {
            let semaphore = Arc::clone(&semaphore);
            let extraction = Arc::clone(&self.extraction);
            let merger = Arc::clone(&self.merger);
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("semaphore closed: {e}")))?;
                let extracted = extraction.extract_chunk(&source).await?;
                merger.merge_chunk(&extracted).await
            })
        });

        let results = join_all(tasks).await;

        let mut first_error = None;
        for result in results {
            let outcome = result.map_err(AppError::Join).and_then(|inner| inner);
            if let Err(err) = outcome {
                tracing::error!(error = %err, "chunk failed; ingestion will abort");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn finish(&self, machine: IngestionMachine<(), Merged>) -> Result<(), AppError> {
        machine
            .sync()
            .map(|_| ())
            .map_err(|(_, guard)| map_guard_error("sync", &guard))
    }
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::Internal(format!(
        "invalid ingestion pipeline transition during {event}: {guard:?}"
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use common::storage::{MemoryGraphStore, MemoryKvStore, MemoryVectorStore};
    use common::tokenizer::ApproxTokenizer;

    use super::*;
    use crate::handler::TextSplitterHandler;

    struct ScriptedLm {
        replies: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LmClient for ScriptedLm {
        async fn chat(&self, _messages: &[String]) -> Result<String, AppError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .get(idx)
                .cloned()
                .ok_or_else(|| AppError::Lm("no more scripted replies".into()))
        }
    }

    fn handler() -> Arc<dyn DocumentHandler> {
        Arc::new(TextSplitterHandler {
            goal: "extract entities".into(),
            entity_types: vec!["PERSON".into(), "PLACE".into()],
            language: "English".into(),
            examples: vec![],
            min_tokens: 2,
            max_tokens: 50,
            overlap_tokens: 0,
            max_retries: 0,
            concurrency_count: 1,
            backoff: Duration::from_millis(1),
            glean_count: 0,
            max_summaries_token_length: 200,
        })
    }

    #[tokio::test]
    async fn ingests_single_chunk_document_end_to_end() {
        let lm = Arc::new(ScriptedLm {
            replies: vec![
                r#"{"entities":[{"entity_name":"Alice","entity_type":"person","entity_description":"a woman"},{"entity_name":"Bob","entity_type":"person","entity_description":"a man"}],"relationships":[{"source_entity":"Alice","target_entity":"Bob","relationship_description":"met","relationship_keywords":["meeting"],"relationship_strength":3}]}"#.to_string(),
            ],
            calls: AtomicUsize::new(0),
        });
        let kv = Arc::new(MemoryKvStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let vector = Arc::new(MemoryVectorStore::new());
        let pipeline = IngestionPipeline::new(
            handler(),
            kv.clone(),
            graph.clone(),
            vector,
            lm,
            Arc::new(ApproxTokenizer),
        );

        let document = Document {
            id: "d1".into(),
            content: "Alice met Bob in Paris.".into(),
        };
        pipeline.ingest_document(&document).await.unwrap();

        let source = kv.kv_source("d1-chunk-0").await.unwrap();
        assert_eq!(source.order_index, 0);

        let alice = graph.graph_entity("ALICE").await.unwrap();
        assert_eq!(alice.entity_type, "PERSON");
        let relationship = graph.graph_relationship("ALICE", "BOB").await.unwrap();
        assert_eq!(relationship.weight, 3.0);
    }

    #[tokio::test]
    async fn chunk_failure_aborts_but_keeps_other_chunk_effects() {
        // Bypasses the real chunker (whose exact split count is an
        // implementation detail of `text-splitter`) and feeds `run_chunks`
        // two sources directly: one that will extract cleanly and one that
        // will exhaust its retries, to check that the first chunk's merge
        // survives the second chunk's failure.
        let lm = Arc::new(ScriptedLm {
            replies: vec![
                r#"{"entities":[{"entity_name":"Alice","entity_type":"person","entity_description":"a woman"}],"relationships":[]}"#.to_string(),
                "not json".to_string(),
            ],
            calls: AtomicUsize::new(0),
        });
        let kv = Arc::new(MemoryKvStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let vector = Arc::new(MemoryVectorStore::new());
        let pipeline = IngestionPipeline::new(
            handler(),
            kv.clone(),
            graph.clone(),
            vector,
            lm,
            Arc::new(ApproxTokenizer),
        );

        let sources = vec![
            common::model::Source::new("d2", 0, "Alice is here.".into(), 4),
            common::model::Source::new("d2", 1, "Zork zork zork.".into(), 4),
        ];
        let result = pipeline.run_chunks(sources).await;
        assert!(result.is_err());

        let alice = graph.graph_entity("ALICE").await.unwrap();
        assert_eq!(alice.entity_type, "PERSON");
    }
}
