use serde::Deserialize;

use common::error::AppError;
use common::lm::LmClient;

use crate::handler::KeywordHandler;

/// One turn of a conversation (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
}

/// The two keyword sets C5 hands to the retriever (spec.md §4.5 Output):
/// comma-joined strings used as the semantic queries for the local and
/// global retrieval paths respectively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keywords {
    pub low_keywords: String,
    pub high_keywords: String,
}

#[derive(Debug, Deserialize)]
struct RawKeywords {
    #[serde(default)]
    high_level_keywords: Vec<String>,
    #[serde(default)]
    low_level_keywords: Vec<String>,
}

/// C5 — Keyword Extractor (spec.md §4.5). The most recent user message is
/// the query; everything preceding it is the history. Parse failure is
/// fatal, no retry at this layer.
#[tracing::instrument(skip(handler, lm, conversation))]
pub async fn extract_keywords(
    handler: &dyn KeywordHandler,
    lm: &dyn LmClient,
    conversation: &[ConversationTurn],
) -> Result<Keywords, AppError> {
    let query_index = conversation
        .iter()
        .rposition(|turn| turn.role == Role::User)
        .ok_or(AppError::NoUserMessage)?;

    let query = &conversation[query_index].message;
    let history = conversation[..query_index]
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            format!("{speaker}: {}", turn.message)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = handler.build_keyword_prompt(query, &history);
    let reply = lm.chat(&[prompt]).await?;
    let cleaned = reply.replace('\\', "");

    let raw: RawKeywords = serde_json::from_str(&cleaned)
        .map_err(|e| AppError::LmParsing(format!("invalid keyword JSON: {e}")))?;

    Ok(Keywords {
        low_keywords: raw.low_level_keywords.join(", "),
        high_keywords: raw.high_level_keywords.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::handler::DefaultKeywordHandler;

    struct ScriptedLm(&'static str);

    #[async_trait]
    impl LmClient for ScriptedLm {
        async fn chat(&self, _messages: &[String]) -> Result<String, AppError> {
            Ok(self.0.to_string())
        }
    }

    fn handler() -> DefaultKeywordHandler {
        DefaultKeywordHandler {
            goal: "extract keywords".into(),
            examples: vec![],
        }
    }

    #[tokio::test]
    async fn extracts_query_and_history_and_parses_keywords() {
        let lm = ScriptedLm(r#"{"high_level_keywords":["travel"],"low_level_keywords":["Alice","Paris"]}"#);
        let conversation = vec![
            ConversationTurn {
                role: Role::User,
                message: "Who is Alice?".into(),
            },
            ConversationTurn {
                role: Role::Assistant,
                message: "Alice is a person mentioned in the text.".into(),
            },
            ConversationTurn {
                role: Role::User,
                message: "Where did she go?".into(),
            },
        ];
        let keywords = extract_keywords(&handler(), &lm, &conversation).await.unwrap();
        assert_eq!(keywords.high_keywords, "travel");
        assert_eq!(keywords.low_keywords, "Alice, Paris");
    }

    #[tokio::test]
    async fn no_user_message_is_fatal() {
        let lm = ScriptedLm("{}");
        let conversation = vec![ConversationTurn {
            role: Role::Assistant,
            message: "hello".into(),
        }];
        let err = extract_keywords(&handler(), &lm, &conversation).await.unwrap_err();
        assert!(matches!(err, AppError::NoUserMessage));
    }

    #[tokio::test]
    async fn malformed_json_is_fatal_without_retry() {
        let lm = ScriptedLm("not json");
        let conversation = vec![ConversationTurn {
            role: Role::User,
            message: "hi".into(),
        }];
        let err = extract_keywords(&handler(), &lm, &conversation).await.unwrap_err();
        assert!(matches!(err, AppError::LmParsing(_)));
    }
}
