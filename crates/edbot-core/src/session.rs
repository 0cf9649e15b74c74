use std::sync::Arc;

use edbot_llm::LlmProvider;

use crate::context::{assemble_messages, build_instruction};
use crate::conversation::Conversation;
use crate::error::ChatError;
use crate::resources::Resources;

/// Where a session is within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingUserInput,
    Retrieving,
    Generating,
    Displayed,
    Failed,
}

/// One user's chat: private conversation plus shared resources.
///
/// A turn is committed only when the model replies; a failed turn leaves the
/// conversation exactly as it was.
pub struct ChatSession<P: LlmProvider> {
    resources: Arc<Resources<P>>,
    conversation: Conversation,
    state: TurnState,
}

impl<P: LlmProvider> ChatSession<P> {
    #[must_use]
    pub fn new(resources: Arc<Resources<P>>) -> Self {
        let conversation = resources.new_conversation();
        Self {
            resources,
            conversation,
            state: TurnState::Idle,
        }
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[must_use]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Clear history back to the opening greeting.
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.state = TurnState::Idle;
        tracing::debug!("conversation reset");
    }

    /// Run one turn and return the assistant reply.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyInput`] for blank text, or the retrieval or
    /// chat failure that ended the turn.
    pub async fn submit(&mut self, text: &str) -> Result<String, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        self.state = TurnState::AwaitingUserInput;
        match self.run_turn(text).await {
            Ok(reply) => {
                self.conversation.push_exchange(text, reply.clone());
                self.state = TurnState::Displayed;
                Ok(reply)
            }
            Err(e) => {
                self.state = TurnState::Failed;
                tracing::error!(kind = e.kind().as_str(), "turn failed: {e}");
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self, text: &str) -> Result<String, ChatError> {
        let variant = self.resources.variant();

        let hits = if variant.uses_retrieval() {
            self.state = TurnState::Retrieving;
            self.resources.retrieve(text).await?
        } else {
            Vec::new()
        };

        self.state = TurnState::Generating;
        let messages = assemble_messages(
            build_instruction(variant, &hits),
            self.conversation.to_messages(),
            text,
        );
        let reply = self.resources.provider().chat(&messages).await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use edbot_knowledge::{Document, KnowledgeIndex};
    use edbot_llm::mock::MockProvider;
    use edbot_llm::{LlmError, Role};

    use super::*;
    use crate::config::{Config, Variant};
    use crate::context::{GREETING, PERSONA};
    use crate::conversation::TurnRole;
    use crate::resources::tests::knowledge_config;

    fn session(provider: &MockProvider, variant: Variant) -> ChatSession<MockProvider> {
        let mut config = Config::default();
        config.bot.variant = variant;
        ChatSession::new(Arc::new(Resources::new(provider.clone(), &config)))
    }

    #[tokio::test]
    async fn plain_turns_double_history() {
        let provider = MockProvider::with_responses(vec!["a1".into(), "a2".into(), "a3".into()]);
        let mut s = session(&provider, Variant::Plain);

        for q in ["q1", "q2", "q3"] {
            s.submit(q).await.unwrap();
        }

        let turns = s.conversation().turns();
        assert_eq!(turns.len(), 6);
        let texts: Vec<&str> = turns.iter().map(|t| t.text()).collect();
        assert_eq!(texts, ["q1", "a1", "q2", "a2", "q3", "a3"]);
        assert_eq!(s.state(), TurnState::Displayed);

        let last = provider.chat_log().pop().unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].role, Role::User);
    }

    #[tokio::test]
    async fn persona_turns_keep_greeting_first() {
        let provider = MockProvider::default();
        let mut s = session(&provider, Variant::Persona);

        s.submit("q1").await.unwrap();
        s.submit("q2").await.unwrap();

        let turns = s.conversation().turns();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].text(), GREETING);
        let roles: Vec<TurnRole> = turns.iter().map(|t| t.role()).collect();
        assert_eq!(
            roles,
            [
                TurnRole::Assistant,
                TurnRole::User,
                TurnRole::Assistant,
                TurnRole::User,
                TurnRole::Assistant
            ]
        );

        let sent = &provider.chat_log()[1];
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].content, PERSONA);
        assert_eq!(sent[1].content, GREETING);
        assert_eq!(sent.last().unwrap().content, "q2");
    }

    #[tokio::test]
    async fn reset_leaves_single_greeting() {
        let provider = MockProvider::default();
        let mut s = session(&provider, Variant::Persona);
        s.submit("q1").await.unwrap();

        s.reset();
        let turns = s.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role(), TurnRole::Assistant);
        assert_eq!(s.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn failed_chat_commits_nothing() {
        let provider = MockProvider::failing();
        let mut s = session(&provider, Variant::Persona);
        s.conversation.push_exchange("q1", "a1");
        let before = s.conversation().turns().to_vec();

        let err = s.submit("q2").await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(LlmError::Other(_))));
        assert_eq!(s.state(), TurnState::Failed);
        assert_eq!(s.conversation().turns(), before.as_slice());
        assert_eq!(provider.chat_log().len(), 1);

        // the next submission starts a fresh turn
        let err = s.submit("q2").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Network);
        assert_eq!(s.conversation().len(), 3);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_call() {
        let provider = MockProvider::default();
        let mut s = session(&provider, Variant::Plain);

        let err = s.submit("   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyInput));
        assert!(provider.chat_log().is_empty());
        assert!(s.conversation().is_empty());
        assert_eq!(s.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn retrieval_context_reaches_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = knowledge_config(&dir, Variant::Retrieval);
        let provider = MockProvider::with_responses(vec!["Try Agile Fundamentals.".into()]);
        let resources = Arc::new(Resources::new(provider.clone(), &config));
        resources.warm_up().await.unwrap();
        let mut s = ChatSession::new(resources);

        let reply = s.submit("Do you have agile scrum training?").await.unwrap();
        assert_eq!(reply, "Try Agile Fundamentals.");

        let sent = provider.chat_log().pop().unwrap();
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].content.starts_with(PERSONA.trim_end()));
        assert!(sent[0].content.contains("Course: Agile Fundamentals"));
        assert!(sent[0].content.contains("RELEVANT INFORMATION"));
        assert_eq!(s.conversation().len(), 3);
    }

    #[tokio::test]
    async fn retrieval_failure_commits_nothing() {
        let provider = MockProvider::failing_embeddings();
        let doc = Document {
            id: "course-0".into(),
            text: "Course: Agile Fundamentals".into(),
            metadata: BTreeMap::new(),
        };
        let index = KnowledgeIndex::from_embeddings(vec![(vec![1.0; 64], doc)]).unwrap();
        let mut config = Config::default();
        config.bot.variant = Variant::Retrieval;
        let resources = Resources::new(provider.clone(), &config).with_prebuilt_index(index);
        let mut s = ChatSession::new(Arc::new(resources));

        let err = s.submit("agile").await.unwrap_err();
        assert!(matches!(err, ChatError::Retrieval(_)));
        assert_eq!(s.state(), TurnState::Failed);
        assert_eq!(s.conversation().len(), 1);
        assert!(provider.chat_log().is_empty());
    }
}
