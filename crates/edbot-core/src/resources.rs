use edbot_knowledge::{KnowledgeIndex, KnowledgeSources, Retriever, ScoredDocument};
use edbot_llm::LlmProvider;
use tokio::sync::OnceCell;

use crate::config::{Config, Variant};
use crate::context::GREETING;
use crate::conversation::Conversation;
use crate::error::ChatError;

/// Process-wide, read-only chat resources shared by every session.
///
/// The knowledge index is built at most once; concurrent first callers await
/// the same initialization.
pub struct Resources<P: LlmProvider> {
    provider: P,
    variant: Variant,
    top_k: usize,
    embed_batch_size: usize,
    sources: KnowledgeSources,
    index: OnceCell<KnowledgeIndex>,
}

impl<P: LlmProvider> Resources<P> {
    #[must_use]
    pub fn new(provider: P, config: &Config) -> Self {
        Self {
            provider,
            variant: config.bot.variant,
            top_k: config.knowledge.top_k,
            embed_batch_size: config.knowledge.embed_batch_size,
            sources: KnowledgeSources {
                courses: config.knowledge.courses_path.clone(),
                general_info: config.knowledge.info_path.clone(),
            },
            index: OnceCell::new(),
        }
    }

    /// Use an already built index instead of ingesting the configured sources.
    #[must_use]
    pub fn with_prebuilt_index(mut self, index: KnowledgeIndex) -> Self {
        self.index = OnceCell::new_with(Some(index));
        self
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Opening assistant turn, if this variant has one.
    #[must_use]
    pub fn greeting(&self) -> Option<&'static str> {
        self.variant.has_persona().then_some(GREETING)
    }

    #[must_use]
    pub fn new_conversation(&self) -> Conversation {
        Conversation::new(self.greeting())
    }

    /// Number of indexed documents, once the index exists.
    #[must_use]
    pub fn indexed_documents(&self) -> Option<usize> {
        self.index.get().map(KnowledgeIndex::len)
    }

    /// Ingest, embed and index the knowledge sources on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if ingestion or any embedding call fails. A failed
    /// attempt leaves the cell empty.
    pub async fn index(&self) -> Result<&KnowledgeIndex, ChatError> {
        self.index
            .get_or_try_init(|| async {
                let documents = edbot_knowledge::ingest(&self.sources)?;
                let index =
                    KnowledgeIndex::build(&self.provider, documents, self.embed_batch_size)
                        .await?;
                Ok::<_, ChatError>(index)
            })
            .await
    }

    /// Force every startup-time resource so failures surface before serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the retrieval variant cannot build its index.
    pub async fn warm_up(&self) -> Result<(), ChatError> {
        if self.variant.uses_retrieval() {
            let index = self.index().await?;
            tracing::info!(
                documents = index.len(),
                dimensions = index.dimensions(),
                "knowledge index ready"
            );
        }
        Ok(())
    }

    /// Top-k documents for `query`, most similar first.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is unavailable or the query cannot be embedded.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, ChatError> {
        let index = self.index().await?;
        Retriever::new(&self.provider, index, self.top_k)
            .retrieve(query)
            .await
            .map_err(ChatError::Retrieval)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use edbot_llm::mock::MockProvider;

    use super::*;

    pub(crate) const COURSES: &str = "course_name,category,duration,format,target_audience,prerequisites,description,key_topics,learning_outcomes,pricing,customization,course_page\n\
Agile Fundamentals,Project Management,2 days,Virtual,Managers,None,Scrum and Kanban basics,Scrum sprints,Run sprints,On request,Yes,https://www.edstellar.com/course/agile\n\
Python for Data,Technology,3 days,Onsite,Engineers,None,Python programming for data work,Pandas,Write pipelines,On request,Yes,https://www.edstellar.com/course/python\n";

    pub(crate) const INFO: &str = "title,description,url,info_type\n\
Contact,Email info@edstellar.com for a quote,https://www.edstellar.com/contact,contact\n\
Empty,,https://www.edstellar.com/empty,faq\n";

    pub(crate) fn knowledge_config(dir: &tempfile::TempDir, variant: Variant) -> Config {
        let courses = dir.path().join("courses.csv");
        let info = dir.path().join("info.csv");
        std::fs::File::create(&courses)
            .unwrap()
            .write_all(COURSES.as_bytes())
            .unwrap();
        std::fs::File::create(&info)
            .unwrap()
            .write_all(INFO.as_bytes())
            .unwrap();

        let mut config = Config::default();
        config.bot.variant = variant;
        config.knowledge.courses_path = courses;
        config.knowledge.info_path = info;
        config
    }

    #[tokio::test]
    async fn index_is_built_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = knowledge_config(&dir, Variant::Retrieval);
        let provider = MockProvider::default();
        let resources = Resources::new(provider.clone(), &config);

        assert_eq!(resources.indexed_documents(), None);
        resources.warm_up().await.unwrap();
        assert_eq!(resources.indexed_documents(), Some(3));
        resources.index().await.unwrap();
        assert_eq!(provider.embed_calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_use_builds_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = knowledge_config(&dir, Variant::Retrieval);
        let provider = MockProvider::default().with_delay(20);
        let resources = Arc::new(Resources::new(provider.clone(), &config));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let r = Arc::clone(&resources);
                tokio::spawn(async move { r.index().await.map(KnowledgeIndex::len) })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 3);
        }
        assert_eq!(provider.embed_calls(), 1);
    }

    #[tokio::test]
    async fn warm_up_skips_index_for_persona() {
        let provider = MockProvider::default();
        let mut config = Config::default();
        config.bot.variant = Variant::Persona;
        config.knowledge.courses_path = "/nonexistent/courses.csv".into();
        let resources = Resources::new(provider.clone(), &config);

        resources.warm_up().await.unwrap();
        assert_eq!(provider.embed_calls(), 0);
        assert_eq!(resources.greeting(), Some(GREETING));
    }

    #[tokio::test]
    async fn missing_sources_fail_warm_up() {
        let mut config = Config::default();
        config.knowledge.courses_path = "/nonexistent/courses.csv".into();
        let resources = Resources::new(MockProvider::default(), &config);

        let err = resources.warm_up().await.unwrap_err();
        assert!(matches!(err, ChatError::Ingest(_)));
        assert!(resources.indexed_documents().is_none());
    }

    #[tokio::test]
    async fn embedding_failure_fails_warm_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = knowledge_config(&dir, Variant::Retrieval);
        let resources = Resources::new(MockProvider::failing_embeddings(), &config);
        let err = resources.warm_up().await.unwrap_err();
        assert!(matches!(err, ChatError::Index(_)));
    }

    #[tokio::test]
    async fn retrieve_returns_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = knowledge_config(&dir, Variant::Retrieval);
        config.knowledge.top_k = 2;
        let resources = Resources::new(MockProvider::default(), &config);

        let hits = resources.retrieve("agile scrum sprints").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.title(), Some("Agile Fundamentals"));
    }

    #[test]
    fn plain_variant_has_no_greeting() {
        let mut config = Config::default();
        config.bot.variant = Variant::Plain;
        let resources = Resources::new(MockProvider::default(), &config);
        assert!(resources.greeting().is_none());
        assert!(resources.new_conversation().is_empty());
    }
}
