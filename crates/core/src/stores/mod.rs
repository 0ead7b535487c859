pub mod memory;
pub mod qdrant;

pub use memory::{cosine_distance, InMemoryIndex};
pub use qdrant::QdrantStore;
