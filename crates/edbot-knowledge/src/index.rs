use edbot_llm::LlmProvider;

use crate::document::Document;
use crate::error::IndexError;

struct IndexEntry {
    vector: Vec<f32>,
    document: Document,
}

/// Immutable nearest-neighbour index over embedded documents.
///
/// Holds exactly one entry per document. Similarity is cosine; ties keep
/// ingestion order, so identical queries always yield identical rankings.
pub struct KnowledgeIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl std::fmt::Debug for KnowledgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeIndex")
            .field("documents", &self.entries.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub score: f32,
    pub document: Document,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl KnowledgeIndex {
    /// Embed every document in batches of `batch_size` (one provider call per
    /// batch) and build the index.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no documents, an embedding call fails, or
    /// the provider returns a wrong number of vectors or mixed dimensions.
    pub async fn build<P: LlmProvider>(
        provider: &P,
        documents: Vec<Document>,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        if documents.is_empty() {
            return Err(IndexError::Empty);
        }

        let batch_size = batch_size.max(1);
        let mut vectors = Vec::with_capacity(documents.len());
        for (n, batch) in documents.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embedded = provider.embed_batch(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(IndexError::EmbeddingCount {
                    expected: texts.len(),
                    actual: embedded.len(),
                });
            }
            tracing::debug!(batch = n, size = texts.len(), "embedded document batch");
            vectors.extend(embedded);
        }

        let index = Self::from_embeddings(vectors.into_iter().zip(documents).collect())?;
        tracing::info!(
            documents = index.len(),
            dimensions = index.dimensions,
            provider = provider.name(),
            "knowledge index built"
        );
        Ok(index)
    }

    /// Build from precomputed `(embedding, document)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if `pairs` is empty or embeddings differ in dimension.
    pub fn from_embeddings(pairs: Vec<(Vec<f32>, Document)>) -> Result<Self, IndexError> {
        let Some(dimensions) = pairs.first().map(|(v, _)| v.len()) else {
            return Err(IndexError::Empty);
        };

        let mut entries = Vec::with_capacity(pairs.len());
        for (vector, document) in pairs {
            if vector.len() != dimensions {
                return Err(IndexError::Dimension {
                    id: document.id,
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            entries.push(IndexEntry { vector, document });
        }

        Ok(Self {
            entries,
            dimensions,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }

    /// Return the `limit` most similar documents, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query dimension differs from the index.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredDocument>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::QueryDimension {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .collect();

        // stable: equal scores keep ingestion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                score,
                document: self.entries[i].document.clone(),
            })
            .collect())
    }
}
