//! C1-C4 of the hybrid RAG core: chunking, extraction (with gleaning and
//! retry), merging against the knowledge graph, and vector sync.

pub mod chunking;
pub mod extraction;
pub mod handler;
pub mod merge;
pub mod pipeline;
pub mod state;

pub use chunking::{chunk_document, Document};
pub use handler::{DocumentHandler, ExtractionPromptData, TextSplitterHandler};
pub use pipeline::IngestionPipeline;
