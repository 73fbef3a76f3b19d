use std::sync::OnceLock;

use crate::error::AppError;

/// The tokenizer collaborator (spec.md §1): a function returning the token
/// count of a string under a fixed encoding. Used by the merger to decide
/// whether joined descriptions need LM summarization (spec.md §4.3 step 5).
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// `tokenizers`-backed implementation, mirroring the template's
/// `get_tokenizer` (a lazily-initialized `bert-base-cased` tokenizer shared
/// process-wide).
#[derive(Debug, Default)]
pub struct HfTokenizer;

impl HfTokenizer {
    fn get() -> Result<&'static tokenizers::Tokenizer, AppError> {
        static TOKENIZER: OnceLock<Result<tokenizers::Tokenizer, String>> = OnceLock::new();
        match TOKENIZER.get_or_init(|| {
            tokenizers::Tokenizer::from_pretrained("bert-base-cased", None)
                .map_err(|e| format!("failed to initialize tokenizer: {e}"))
        }) {
            Ok(tokenizer) => Ok(tokenizer),
            Err(err) => Err(AppError::Internal(err.clone())),
        }
    }
}

impl Tokenizer for HfTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        match Self::get().and_then(|tokenizer| {
            tokenizer
                .encode(text, false)
                .map_err(|e| AppError::Internal(format!("tokenization failed: {e}")))
        }) {
            Ok(encoding) => encoding.len(),
            Err(err) => {
                tracing::warn!(error = %err, "falling back to char-based token estimate");
                text.chars().count().div_ceil(4)
            }
        }
    }
}

/// A dependency-free tokenizer used by tests and by callers who don't want
/// to pull the HF tokenizer weights, approximating GPT-style tokenization
/// at ~4 characters per token.
#[derive(Debug, Default)]
pub struct ApproxTokenizer;

impl Tokenizer for ApproxTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
