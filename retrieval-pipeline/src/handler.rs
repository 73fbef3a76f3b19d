/// Prompt scaffolding for keyword extraction, filled by the handler and
/// completed by the core with `query`/`history` (spec.md §6 "Handler
/// (query)").
#[derive(Debug, Clone)]
pub struct KeywordPromptData {
    pub goal: String,
    pub examples: Vec<String>,
}

/// The keyword-extraction policy object (spec.md §1's "handler", §6's
/// "Handler (query)").
pub trait KeywordHandler: Send + Sync {
    fn keyword_extraction_prompt_data(&self) -> KeywordPromptData;

    /// Builds the single keyword-extraction prompt for a query/history pair
    /// from [`keyword_extraction_prompt_data`](Self::keyword_extraction_prompt_data).
    fn build_keyword_prompt(&self, query: &str, history: &str) -> String {
        let data = self.keyword_extraction_prompt_data();
        format!(
            "Goal: {}\nExamples:\n{}\nConversation history:\n{}\nQuery:\n{}\n\nRespond with a JSON object {{\"high_level_keywords\": [...], \"low_level_keywords\": [...]}}.",
            data.goal,
            data.examples.join("\n---\n"),
            history,
            query,
        )
    }
}

/// A fixed default handler carrying a static goal and example set, suitable
/// when no domain-specific keyword prompt tuning is required.
pub struct DefaultKeywordHandler {
    pub goal: String,
    pub examples: Vec<String>,
}

impl KeywordHandler for DefaultKeywordHandler {
    fn keyword_extraction_prompt_data(&self) -> KeywordPromptData {
        KeywordPromptData {
            goal: self.goal.clone(),
            examples: self.examples.clone(),
        }
    }
}
