//! C5 of the hybrid RAG core: turns a conversation into high-level and
//! low-level keyword sets via the LM.

pub mod handler;
pub mod keywords;

pub use handler::{DefaultKeywordHandler, KeywordHandler, KeywordPromptData};
pub use keywords::{extract_keywords, ConversationTurn, Keywords, Role};
