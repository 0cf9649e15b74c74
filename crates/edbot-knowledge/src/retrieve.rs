use edbot_llm::LlmProvider;

use crate::error::IndexError;
use crate::index::{KnowledgeIndex, ScoredDocument};

pub const DEFAULT_TOP_K: usize = 3;

/// Per-query retrieval over a built index.
///
/// The query is embedded by the same provider that embedded the documents.
/// There is no similarity threshold: the top `k` are always returned.
pub struct Retriever<'a, P: LlmProvider> {
    provider: &'a P,
    index: &'a KnowledgeIndex,
    top_k: usize,
}

impl<'a, P: LlmProvider> Retriever<'a, P> {
    #[must_use]
    pub fn new(provider: &'a P, index: &'a KnowledgeIndex, top_k: usize) -> Self {
        Self {
            provider,
            index,
            top_k,
        }
    }

    /// Return `min(top_k, index.len())` documents, most similar first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, IndexError> {
        let vector = self.provider.embed(query).await?;
        let hits = self.index.search(&vector, self.top_k)?;
        tracing::debug!(
            hits = hits.len(),
            top = hits.first().map(|h| h.document.id.as_str()),
            "retrieved context"
        );
        Ok(hits)
    }
}
