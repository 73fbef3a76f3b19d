pub mod graph;
pub mod kv;
pub mod memory;
pub mod vector;

pub use graph::{relationship_map_key, GraphStore};
pub use kv::KvStore;
pub use memory::{MemoryGraphStore, MemoryKvStore, MemoryVectorStore};
pub use vector::VectorStore;
