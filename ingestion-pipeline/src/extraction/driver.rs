use std::sync::Arc;

use common::error::AppError;
use common::lm::LmClient;
use common::model::Source;

use crate::handler::DocumentHandler;

use super::parsing::{parse_extraction_reply, RawEntity, RawRelationship};
use super::{dedup_normalize, ChunkExtraction};

/// C2 — Extraction Driver (spec.md §4.2). Drives one chunk's extraction
/// conversation: initial extract, bounded gleaning, and outer retry on any
/// LM or parse failure.
pub struct ExtractionDriver {
    lm: Arc<dyn LmClient>,
    handler: Arc<dyn DocumentHandler>,
}

impl ExtractionDriver {
    #[must_use]
    pub fn new(lm: Arc<dyn LmClient>, handler: Arc<dyn DocumentHandler>) -> Self {
        Self { lm, handler }
    }

    /// Runs the full per-chunk protocol, retrying from a fresh conversation
    /// up to `maxRetries` times on any failure (spec.md §4.2 steps 2-4,
    /// §9's `Extract`/`Glean`/`Decide` automaton).
    #[tracing::instrument(skip(self), fields(chunk_id = %chunk.id))]
    pub async fn extract_chunk(&self, chunk: &Source) -> Result<ChunkExtraction, AppError> {
        let max_retries = self.handler.max_retries();
        let mut attempt = 0usize;

        loop {
            match self.run_conversation(chunk).await {
                Ok((entities, relationships)) => {
                    let allowed_types = self.handler.entity_extraction_prompt_data().entity_types;
                    return Ok(dedup_normalize(&chunk.id, entities, relationships, &allowed_types));
                }
                Err(err) if attempt < max_retries => {
                    tracing::warn!(attempt, error = %err, "extraction attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.handler.backoff_duration()).await;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "extraction exhausted retries");
                    return Err(AppError::ExtractionExhausted(attempt));
                }
            }
        }
    }

    /// One full conversation attempt: initial extract plus the bounded
    /// glean loop. Any error here (LM failure or parse failure, at any
    /// point in the conversation) propagates to the caller, which restarts
    /// a brand new conversation (spec.md §4.2 step 4: "errors inside the
    /// glean loop re-enter the outer retry from step 2").
    async fn run_conversation(
        &self,
        chunk: &Source,
    ) -> Result<(Vec<RawEntity>, Vec<RawRelationship>), AppError> {
        let mut messages: Vec<String> = Vec::new();

        let extraction_prompt = self.handler.build_extraction_prompt(&chunk.content);
        messages.push(extraction_prompt);
        let resp0 = self.lm.chat(&messages).await?;
        messages.push(resp0.clone());
        let parsed0 = parse_extraction_reply(&resp0)?;

        let mut entities = parsed0.entities;
        let mut relationships = parsed0.relationships;

        let glean_count = self.handler.glean_count();
        for iteration in 0..glean_count {
            messages.push(self.handler.glean_prompt());
            let glean_reply = self.lm.chat(&messages).await?;
            messages.push(glean_reply.clone());
            let parsed = parse_extraction_reply(&glean_reply)?;
            entities.extend(parsed.entities);
            relationships.extend(parsed.relationships);

            if iteration + 1 == glean_count {
                break;
            }

            messages.push(self.handler.decide_prompt());
            let decide_reply = self.lm.chat(&messages).await?;
            messages.push(decide_reply.clone());
            let decision = decide_reply
                .to_lowercase()
                .trim()
                .trim_matches('"')
                .trim()
                .to_string();
            if decision != "yes" {
                break;
            }
        }

        Ok((entities, relationships))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::handler::{ExtractionPromptData, TextSplitterHandler};

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

    fn test_handler(glean_count: usize, max_retries: usize) -> TextSplitterHandler {
        TextSplitterHandler {
            goal: "extract".into(),
            entity_types: vec!["PERSON".into()],
            language: "English".into(),
            examples: vec![],
            min_tokens: 2,
            max_tokens: 50,
            overlap_tokens: 0,
            max_retries,
            concurrency_count: 1,
            backoff: Duration::from_millis(1),
            glean_count,
            max_summaries_token_length: 200,
        }
    }

    fn chunk() -> Source {
        Source::new("d1", 0, "Alice met Bob in Paris.".into(), 6)
    }

    #[tokio::test]
    async fn glean_count_zero_skips_decide_call() {
        let lm = Arc::new(ScriptedLm {
            replies: vec![
                r#"{"entities":[{"entity_name":"Alice","entity_type":"person","entity_description":"a woman"}],"relationships":[]}"#
                    .to_string(),
            ],
            calls: AtomicUsize::new(0),
        });
        let handler = Arc::new(test_handler(0, 3));
        let driver = ExtractionDriver::new(lm.clone(), handler);
        let extraction = driver.extract_chunk(&chunk()).await.unwrap();
        assert_eq!(extraction.entities_by_name.len(), 1);
        assert_eq!(lm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn glean_loop_accumulates_and_stops_on_no() {
        let lm = Arc::new(ScriptedLm {
            replies: vec![
                r#"{"entities":[{"entity_name":"Alice","entity_type":"person","entity_description":"a woman"}],"relationships":[]}"#.to_string(),
                r#"{"entities":[{"entity_name":"Bob","entity_type":"person","entity_description":"a man"}],"relationships":[]}"#.to_string(),
                "\"NO\"".to_string(),
            ],
            calls: AtomicUsize::new(0),
        });
        let handler = Arc::new(test_handler(2, 3));
        let driver = ExtractionDriver::new(lm.clone(), handler);
        let extraction = driver.extract_chunk(&chunk()).await.unwrap();
        assert_eq!(extraction.entities_by_name.len(), 2);
        assert_eq!(lm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn max_retries_zero_fails_immediately() {
        let lm = Arc::new(ScriptedLm {
            replies: vec!["not json".to_string()],
            calls: AtomicUsize::new(0),
        });
        let handler = Arc::new(test_handler(0, 0));
        let driver = ExtractionDriver::new(lm.clone(), handler);
        let err = driver.extract_chunk(&chunk()).await.unwrap_err();
        assert!(matches!(err, AppError::ExtractionExhausted(0)));
        assert_eq!(lm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_after_parse_failure_then_succeeds() {
        let lm = Arc::new(ScriptedLm {
            replies: vec![
                "garbage".to_string(),
                r#"{"entities":[],"relationships":[]}"#.to_string(),
            ],
            calls: AtomicUsize::new(0),
        });
        let handler = Arc::new(test_handler(0, 2));
        let driver = ExtractionDriver::new(lm.clone(), handler);
        let extraction = driver.extract_chunk(&chunk()).await.unwrap();
        assert!(extraction.entities_by_name.is_empty());
        assert_eq!(lm.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_prompt_data_roundtrips() {
        let handler = test_handler(0, 0);
        let data: ExtractionPromptData = handler.entity_extraction_prompt_data();
        assert_eq!(data.entity_types, vec!["PERSON".to_string()]);
    }
}
