use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot read {}: {source}", .path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("{} is missing required column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("malformed row in {} (line {line}): {source}", .path.display())]
    Row {
        path: PathBuf,
        line: u64,
        source: csv::Error,
    },

    #[error("no documents could be ingested from the configured sources")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] edbot_llm::LlmError),

    #[error("embedding provider returned {actual} vector(s) for {expected} document(s)")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("document {id} has a {actual}-dimensional embedding, expected {expected}")]
    Dimension {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("query embedding has {actual} dimension(s), index expects {expected}")]
    QueryDimension { expected: usize, actual: usize },

    #[error("cannot build an index over zero documents")]
    Empty,
}
