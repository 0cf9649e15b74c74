//! Knowledge base for retrieval-augmented answers: CSV ingestion, embedding,
//! an immutable in-memory cosine index, and top-k retrieval.

pub mod document;
pub mod error;
pub mod index;
pub mod ingest;
pub mod retrieve;

pub use document::Document;
pub use error::{IndexError, IngestError};
pub use index::{KnowledgeIndex, ScoredDocument};
pub use ingest::{KnowledgeSources, ingest};
pub use retrieve::{DEFAULT_TOP_K, Retriever};
