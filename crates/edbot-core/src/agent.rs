use std::sync::Arc;

use edbot_llm::LlmProvider;

use crate::channel::Channel;
use crate::resources::Resources;
use crate::session::ChatSession;

/// Command that clears the conversation back to the greeting.
pub const RESET_COMMAND: &str = "/reset";

/// Drives one [`ChatSession`] over a [`Channel`] until EOF.
pub struct Agent<P: LlmProvider, C: Channel> {
    session: ChatSession<P>,
    channel: C,
}

impl<P: LlmProvider, C: Channel> Agent<P, C> {
    #[must_use]
    pub fn new(resources: Arc<Resources<P>>, channel: C) -> Self {
        Self {
            session: ChatSession::new(resources),
            channel,
        }
    }

    #[must_use]
    pub fn session(&self) -> &ChatSession<P> {
        &self.session
    }

    /// Show the opening turn, then answer messages until the channel closes.
    ///
    /// Turn failures are reported on the channel and do not end the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if channel I/O fails.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.send_history().await?;

        loop {
            let Some(incoming) = self.channel.recv().await? else {
                break;
            };
            let text = incoming.text.trim();

            if text == RESET_COMMAND {
                self.session.reset();
                self.send_history().await?;
                continue;
            }
            if text.is_empty() {
                continue;
            }

            self.channel.send_status("EdBot is thinking...").await?;
            match self.session.submit(text).await {
                Ok(reply) => self.channel.send(&reply).await?,
                Err(e) => self.channel.send_error(&e.to_string(), e.hint()).await?,
            }
        }

        Ok(())
    }

    async fn send_history(&mut self) -> anyhow::Result<()> {
        for turn in self.session.conversation().turns() {
            self.channel.send(turn.text()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use edbot_llm::mock::MockProvider;

    use super::*;
    use crate::channel::{ChannelError, ChannelMessage};
    use crate::config::{Config, Variant};
    use crate::context::GREETING;

    #[derive(Default)]
    struct ScriptedChannel {
        inputs: Vec<String>,
        sent: Vec<String>,
        errors: Vec<(String, String)>,
        statuses: usize,
    }

    impl ScriptedChannel {
        fn new(inputs: &[&str]) -> Self {
            Self {
                inputs: inputs.iter().rev().map(|s| (*s).to_owned()).collect(),
                ..Self::default()
            }
        }
    }

    impl Channel for ScriptedChannel {
        async fn recv(&mut self) -> Result<Option<ChannelMessage>, ChannelError> {
            Ok(self.inputs.pop().map(|text| ChannelMessage { text }))
        }

        async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
            self.sent.push(text.to_owned());
            Ok(())
        }

        async fn send_error(&mut self, message: &str, hint: &str) -> Result<(), ChannelError> {
            self.errors.push((message.to_owned(), hint.to_owned()));
            Ok(())
        }

        async fn send_status(&mut self, _text: &str) -> Result<(), ChannelError> {
            self.statuses += 1;
            Ok(())
        }
    }

    fn resources(provider: MockProvider, variant: Variant) -> Arc<Resources<MockProvider>> {
        let mut config = Config::default();
        config.bot.variant = variant;
        Arc::new(Resources::new(provider, &config))
    }

    #[tokio::test]
    async fn greets_then_answers() {
        let provider = MockProvider::with_responses(vec!["We offer Agile courses.".into()]);
        let channel = ScriptedChannel::new(&["Any agile training?"]);
        let mut agent = Agent::new(resources(provider, Variant::Persona), channel);

        agent.run().await.unwrap();

        assert_eq!(agent.channel.sent, [GREETING, "We offer Agile courses."]);
        assert_eq!(agent.channel.statuses, 1);
        assert_eq!(agent.session().conversation().len(), 3);
    }

    #[tokio::test]
    async fn reset_command_clears_history() {
        let provider = MockProvider::default();
        let channel = ScriptedChannel::new(&["hello", "/reset"]);
        let mut agent = Agent::new(resources(provider.clone(), Variant::Persona), channel);

        agent.run().await.unwrap();

        assert_eq!(agent.session().conversation().len(), 1);
        assert_eq!(provider.chat_log().len(), 1);
        assert_eq!(agent.channel.sent.last().map(String::as_str), Some(GREETING));
    }

    #[tokio::test]
    async fn failure_is_reported_and_loop_continues() {
        let provider = MockProvider::failing();
        let channel = ScriptedChannel::new(&["first", "second"]);
        let mut agent = Agent::new(resources(provider.clone(), Variant::Plain), channel);

        agent.run().await.unwrap();

        assert_eq!(agent.channel.errors.len(), 2);
        assert!(agent.channel.errors[0].0.contains("chat request failed"));
        assert!(agent.session().conversation().is_empty());
        assert_eq!(provider.chat_log().len(), 2);
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let provider = MockProvider::default();
        let channel = ScriptedChannel::new(&["", "   "]);
        let mut agent = Agent::new(resources(provider.clone(), Variant::Plain), channel);

        agent.run().await.unwrap();
        assert!(provider.chat_log().is_empty());
        assert!(agent.channel.sent.is_empty());
    }
}
