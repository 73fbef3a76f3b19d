use std::sync::OnceLock;
use std::time::Duration;

use text_splitter::{ChunkCapacity, ChunkConfig, TextSplitter};

use common::error::AppError;

/// Lazily-initialized tokenizer shared by all [`TextSplitterHandler`]
/// instances, mirroring the template's `enricher::get_tokenizer`.
fn get_tokenizer() -> Result<&'static tokenizers::Tokenizer, AppError> {
    static TOKENIZER: OnceLock<Result<tokenizers::Tokenizer, String>> = OnceLock::new();
    match TOKENIZER.get_or_init(|| {
        tokenizers::Tokenizer::from_pretrained("bert-base-cased", None)
            .map_err(|e| format!("failed to initialize tokenizer: {e}"))
    }) {
        Ok(tokenizer) => Ok(tokenizer),
        Err(err) => Err(AppError::Internal(err.clone())),
    }
}

/// Prompt scaffolding for the extraction driver, filled by the handler and
/// completed by the core with the chunk text (spec.md §6 "Handler
/// (document)").
#[derive(Debug, Clone)]
pub struct ExtractionPromptData {
    pub goal: String,
    pub entity_types: Vec<String>,
    pub language: String,
    pub examples: Vec<String>,
}

/// The chunking/extraction policy object (spec.md §1's "handler", §6's
/// "Handler (document)" operations).
pub trait DocumentHandler: Send + Sync {
    /// Splits raw (already-normalized) content into a finite ordered
    /// sequence of chunk texts, without IDs — the adapter assigns those.
    fn chunk(&self, content: &str) -> Result<Vec<String>, AppError>;

    fn entity_extraction_prompt_data(&self) -> ExtractionPromptData;

    fn max_retries(&self) -> usize;

    /// 0 means "1" per spec.md §6.
    fn concurrency_count(&self) -> usize;

    fn backoff_duration(&self) -> Duration;

    fn glean_count(&self) -> usize;

    fn max_summaries_token_length(&self) -> usize;

    /// Builds the extraction prompt for one chunk from
    /// [`entity_extraction_prompt_data`](Self::entity_extraction_prompt_data)
    /// with `input` filled in, per spec.md §6.
    fn build_extraction_prompt(&self, chunk_text: &str) -> String {
        let data = self.entity_extraction_prompt_data();
        format!(
            "Goal: {}\nEntity types: {}\nLanguage: {}\nExamples:\n{}\nInput:\n{}",
            data.goal,
            data.entity_types.join(", "),
            data.language,
            data.examples.join("\n---\n"),
            chunk_text,
        )
    }

    /// The fixed glean prompt appended to the running conversation to ask
    /// for missed entities/relationships (spec.md §4.2 step 4).
    fn glean_prompt(&self) -> String {
        "MANY entities and relationships were missed in the last extraction. \
         Remember to ONLY emit entities that match any of the previously \
         given entity types. Add them below using the same JSON format:"
            .to_string()
    }

    /// The fixed decide prompt ("are there more? YES/NO").
    fn decide_prompt(&self) -> String {
        "It appears some entities and relationships may have still been \
         missed. Answer YES or NO if there are still entities or \
         relationships that need to be added."
            .to_string()
    }
}

/// Normalizes content per spec.md §4.1: trims ASCII whitespace at both
/// ends and removes every NUL byte.
#[must_use]
pub fn normalize_content(content: &str) -> String {
    content.trim_matches(|c: char| c.is_ascii_whitespace()).replace('\0', "")
}

/// The default document handler, splitting text by configured token bounds
/// via `text-splitter`, mirroring the template's `prepare_chunks`.
pub struct TextSplitterHandler {
    pub goal: String,
    pub entity_types: Vec<String>,
    pub language: String,
    pub examples: Vec<String>,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    pub max_retries: usize,
    pub concurrency_count: usize,
    pub backoff: Duration,
    pub glean_count: usize,
    pub max_summaries_token_length: usize,
}

impl TextSplitterHandler {
    /// # Errors
    /// Returns an error if the splitter's token bounds are invalid.
    fn splitter(&self) -> Result<TextSplitter<&'static tokenizers::Tokenizer>, AppError> {
        let tokenizer = get_tokenizer()?;
        let capacity = ChunkCapacity::new(self.min_tokens)
            .with_max(self.max_tokens)
            .map_err(|e| AppError::Validation(format!("invalid chunk token bounds: {e}")))?;
        let config = ChunkConfig::new(capacity)
            .with_overlap(self.overlap_tokens)
            .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?
            .with_sizer(tokenizer);
        Ok(TextSplitter::new(config))
    }
}

impl DocumentHandler for TextSplitterHandler {
    fn chunk(&self, content: &str) -> Result<Vec<String>, AppError> {
        if self.overlap_tokens >= self.min_tokens {
            return Err(AppError::Validation(format!(
                "chunk_min_tokens must be greater than the configured overlap of {}",
                self.overlap_tokens
            )));
        }
        let splitter = self.splitter()?;
        let chunks: Vec<String> = splitter.chunks(content).map(str::to_owned).collect();
        Ok(chunks)
    }

    fn entity_extraction_prompt_data(&self) -> ExtractionPromptData {
        ExtractionPromptData {
            goal: self.goal.clone(),
            entity_types: self.entity_types.clone(),
            language: self.language.clone(),
            examples: self.examples.clone(),
        }
    }

    fn max_retries(&self) -> usize {
        self.max_retries
    }

    fn concurrency_count(&self) -> usize {
        self.concurrency_count
    }

    fn backoff_duration(&self) -> Duration {
        self.backoff
    }

    fn glean_count(&self) -> usize {
        self.glean_count
    }

    fn max_summaries_token_length(&self) -> usize {
        self.max_summaries_token_length
    }
}
